//! Scope resolution and name synthesis for raw nodes.

use fc_core::{BoundaryLevel, RawDiagram, RawNode, normalize};

use crate::tables::ClassificationTables;

/// Separator a system boundary label uses to carry its domain.
pub const DOMAIN_SEPARATOR: &str = ", domain: ";

/// Synthesized name bases too generic to be unique within a file.
const AMBIGUOUS_BASES: [&str; 3] = ["container", "unknown", ""];

/// Enclosing scopes of one node, by canonical name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedScope {
    pub system: Option<String>,
    pub domain: Option<String>,
    pub container: Option<String>,
}

/// Split a system boundary label into canonical `(system, domain)` names.
///
/// `"Billing, domain: finance"` yields `("billing", Some("finance"))`.
#[must_use]
pub fn split_system_label(label: &str) -> (String, Option<String>) {
    match label.split_once(DOMAIN_SEPARATOR) {
        Some((system, domain)) => {
            let domain = normalize(domain);
            (normalize(system), (!domain.is_empty()).then_some(domain))
        }
        None => (normalize(label), None),
    }
}

/// Canonical system name for a system boundary, falling back to its id.
#[must_use]
pub fn system_name(label: &str, source_id: &str) -> (String, Option<String>) {
    let (name, domain) = split_system_label(label);
    if name.is_empty() {
        (normalize(source_id), domain)
    } else {
        (name, domain)
    }
}

/// Nearest system and container boundaries around `node`.
#[must_use]
pub fn resolve_scope(node: &RawNode, diagram: &RawDiagram) -> ResolvedScope {
    let mut scope = ResolvedScope::default();
    for boundary in node
        .enclosing_boundary_ids
        .iter()
        .filter_map(|id| diagram.find_boundary(id))
    {
        match boundary.level {
            BoundaryLevel::System if scope.system.is_none() => {
                let (system, domain) = system_name(&boundary.label, &boundary.source_id);
                scope.system = Some(system);
                scope.domain = domain;
            }
            BoundaryLevel::Container if scope.container.is_none() => {
                let container = normalize(&boundary.label);
                scope.container = Some(if container.is_empty() {
                    normalize(&boundary.source_id)
                } else {
                    container
                });
            }
            _ => {}
        }
    }
    scope
}

/// Canonical name for a node: its declared name, or a synthesized one.
#[must_use]
pub fn entity_name(node: &RawNode, scope: &ResolvedScope, tables: &ClassificationTables) -> String {
    let declared = normalize(&node.declared_name);
    if !declared.is_empty() {
        return declared;
    }

    let technology = normalize(&tables.standardize(&node.declared_technology));
    let suffix = normalize(&node.source_id);

    if let Some(kind_token) = database_kind_token(&node.declared_kind) {
        let base = if technology.is_empty() { kind_token } else { technology };
        return if base.is_empty() {
            "database".to_string()
        } else {
            format!("{base}-database")
        };
    }

    let base = if !technology.is_empty() {
        technology
    } else if let Some(container) = scope.container.as_deref().filter(|c| !c.is_empty()) {
        container.to_string()
    } else {
        "unknown".to_string()
    };

    if AMBIGUOUS_BASES.contains(&base.as_str()) {
        normalize(&format!("{base}-{suffix}"))
    } else {
        base
    }
}

/// For kinds that mention a database, the kind with that word removed.
fn database_kind_token(declared_kind: &str) -> Option<String> {
    let kind = normalize(declared_kind);
    kind.contains("database").then(|| {
        kind.split('-')
            .filter(|token| !token.is_empty() && *token != "database")
            .collect::<Vec<_>>()
            .join("-")
    })
}
