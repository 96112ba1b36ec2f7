use std::collections::BTreeSet;

use fc_core::{DiagramFormat, RawBoundary, RawDiagram, RawEdge, RawNode};

use crate::{DetectionMethod, ParseResult};

pub(crate) struct RawBuilder {
    diagram: RawDiagram,
    seen_ids: BTreeSet<String>,
    warnings: Vec<String>,
}

impl RawBuilder {
    pub(crate) fn new(format: DiagramFormat) -> Self {
        Self {
            diagram: RawDiagram::empty(format),
            seen_ids: BTreeSet::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.diagram.is_empty()
    }

    pub(crate) fn finish(self, confidence: f32, detection_method: DetectionMethod) -> ParseResult {
        ParseResult {
            diagram: self.diagram,
            warnings: self.warnings,
            confidence,
            detection_method,
        }
    }

    /// Register a source id, warning on blanks and repeats.
    fn claim_id(&mut self, id: &str, what: &str) -> Option<String> {
        let normalized_id = id.trim();
        if normalized_id.is_empty() {
            self.add_warning(format!("Encountered {what} with empty identifier; skipped"));
            return None;
        }
        if !self.seen_ids.insert(normalized_id.to_string()) {
            self.add_warning(format!(
                "Duplicate identifier '{normalized_id}' for {what}; later declaration skipped"
            ));
            return None;
        }
        Some(normalized_id.to_string())
    }

    pub(crate) fn push_node(&mut self, mut node: RawNode) -> bool {
        let Some(id) = self.claim_id(&node.source_id, "element") else {
            return false;
        };
        node.source_id = id;
        self.diagram.nodes.push(node);
        true
    }

    pub(crate) fn push_boundary(&mut self, mut boundary: RawBoundary) -> bool {
        let Some(id) = self.claim_id(&boundary.source_id, "boundary") else {
            return false;
        };
        boundary.source_id = id;
        self.diagram.boundaries.push(boundary);
        true
    }

    pub(crate) fn push_edge(&mut self, edge: RawEdge) {
        if edge.source_id.trim().is_empty() || edge.target_id.trim().is_empty() {
            self.add_warning(format!(
                "Relationship '{}' is missing an endpoint; skipped",
                edge.declared_description
            ));
            return;
        }
        self.diagram.edges.push(RawEdge {
            source_id: edge.source_id.trim().to_string(),
            target_id: edge.target_id.trim().to_string(),
            ..edge
        });
    }
}
