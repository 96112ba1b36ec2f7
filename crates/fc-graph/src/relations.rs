//! Relationship classification: API interaction or plain dependency.

use fc_core::{ApiType, normalize};

use crate::tables::ClassificationTables;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeClass {
    /// Synthesizes an `api` entity the target provides and the source consumes.
    Api { name: String, subtype: ApiType },
    Dependency,
}

/// Classify an edge from its declared description and technology.
///
/// `target_name` names the API when the description is blank.
#[must_use]
pub fn classify_relationship(
    tables: &ClassificationTables,
    description: &str,
    technology: &str,
    target_name: &str,
) -> EdgeClass {
    let Some(subtype) = tables.api_type(technology) else {
        return EdgeClass::Dependency;
    };
    let label = if description.trim().is_empty() {
        target_name
    } else {
        description
    };
    EdgeClass::Api {
        name: api_name(label),
        subtype,
    }
}

/// `api-<normalized label>`.
#[must_use]
pub fn api_name(label: &str) -> String {
    normalize(&format!("api-{label}"))
}
