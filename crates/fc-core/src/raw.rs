//! Intermediate records produced by the diagram source adapters.
//!
//! Both adapters emit this shape; nothing downstream knows which encoding a
//! record came from.

use serde::{Deserialize, Serialize};

/// Encoding a diagram file was written in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum DiagramFormat {
    /// draw.io / diagrams.net graph markup (`mxfile`, `mxGraphModel`, exported SVG).
    DrawIo,
    /// Mermaid C4 block text (`C4Context`, `C4Container`, ...).
    MermaidC4,
    #[default]
    Unknown,
}

impl DiagramFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DrawIo => "drawio",
            Self::MermaidC4 => "mermaid-c4",
            Self::Unknown => "unknown",
        }
    }
}

/// Structural level a boundary declares.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum BoundaryLevel {
    System,
    Container,
    /// Grouping with no catalog meaning (enterprise boundaries and the like).
    #[default]
    Generic,
}

impl BoundaryLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Container => "container",
            Self::Generic => "generic",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RawBoundary {
    pub source_id: String,
    pub level: BoundaryLevel,
    pub label: String,
    /// Enclosing boundary ids, nearest first.
    pub enclosing_boundary_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RawNode {
    pub source_id: String,
    pub declared_kind: String,
    pub declared_name: String,
    pub declared_description: String,
    pub declared_technology: String,
    /// Enclosing boundary ids, nearest first.
    pub enclosing_boundary_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RawEdge {
    pub source_id: String,
    pub target_id: String,
    pub declared_description: String,
    pub declared_technology: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RawDiagram {
    pub format: DiagramFormat,
    pub nodes: Vec<RawNode>,
    pub boundaries: Vec<RawBoundary>,
    pub edges: Vec<RawEdge>,
}

impl RawDiagram {
    #[must_use]
    pub fn empty(format: DiagramFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.boundaries.is_empty() && self.edges.is_empty()
    }

    #[must_use]
    pub fn find_node(&self, source_id: &str) -> Option<&RawNode> {
        self.nodes.iter().find(|node| node.source_id == source_id)
    }

    #[must_use]
    pub fn find_boundary(&self, source_id: &str) -> Option<&RawBoundary> {
        self.boundaries
            .iter()
            .find(|boundary| boundary.source_id == source_id)
    }
}
