use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum CatalogErrorCode {
    Configuration,
    #[default]
    MalformedInput,
    UnclassifiableElement,
    EmptyResult,
}

impl CatalogErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "catalog/error/configuration",
            Self::MalformedInput => "catalog/error/malformed-input",
            Self::UnclassifiableElement => "catalog/error/unclassifiable-element",
            Self::EmptyResult => "catalog/error/empty-result",
        }
    }

    /// Whether the condition ends the run rather than skipping one file or element.
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::Configuration | Self::EmptyResult)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("invalid configuration for '{field}': {message}")]
    Configuration { field: String, message: String },
    #[error("malformed diagram {source_name}: {message}")]
    MalformedInput {
        source_name: String,
        message: String,
    },
    #[error("element '{element}' has unclassifiable kind '{declared_kind}'")]
    UnclassifiableElement {
        element: String,
        declared_kind: String,
    },
    #[error("{message}")]
    EmptyResult { message: String },
}

impl CatalogError {
    #[must_use]
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn malformed(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn empty(message: impl Into<String>) -> Self {
        Self::EmptyResult {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn code(&self) -> CatalogErrorCode {
        match self {
            Self::Configuration { .. } => CatalogErrorCode::Configuration,
            Self::MalformedInput { .. } => CatalogErrorCode::MalformedInput,
            Self::UnclassifiableElement { .. } => CatalogErrorCode::UnclassifiableElement,
            Self::EmptyResult { .. } => CatalogErrorCode::EmptyResult,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CatalogError, CatalogErrorCode};

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(
            CatalogError::malformed("a.xml", "missing root").code().as_str(),
            "catalog/error/malformed-input"
        );
        assert_eq!(
            CatalogError::empty("nothing").code(),
            CatalogErrorCode::EmptyResult
        );
    }

    #[test]
    fn only_run_level_conditions_are_fatal() {
        assert!(CatalogErrorCode::Configuration.is_fatal());
        assert!(CatalogErrorCode::EmptyResult.is_fatal());
        assert!(!CatalogErrorCode::MalformedInput.is_fatal());
        assert!(!CatalogErrorCode::UnclassifiableElement.is_fatal());
    }

    #[test]
    fn messages_name_the_offending_file() {
        let err = CatalogError::malformed("ctx.xml", "missing mxGraphModel root");
        assert_eq!(
            err.to_string(),
            "malformed diagram ctx.xml: missing mxGraphModel root"
        );
    }
}
