//! Per-file compilation and the whole-run fold.

use std::collections::{BTreeMap, BTreeSet, btree_map::Entry};

use fc_core::{
    CatalogError, ComponentType, Diagnostic, DiagnosticCategory, Entity, EntityGraph, EntityKey,
    EntityKind, EntitySpec, GroupType, RelationKind, RunConfig, normalize,
};
use fc_parser::ParseResult;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    classify::{EntityClass, classify},
    merge::{merge, merge_entity},
    refine::refine,
    relations::{EdgeClass, classify_relationship},
    scope::{entity_name, resolve_scope, system_name},
    tables::ClassificationTables,
};

/// Entities and diagnostics extracted from one diagram file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileCatalog {
    pub source_name: String,
    pub entities: EntityGraph,
    pub diagnostics: Vec<Diagnostic>,
}

/// Final merged graph of a run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogGraph {
    pub entities: EntityGraph,
    pub diagnostics: Vec<Diagnostic>,
    pub files_seen: usize,
    pub files_skipped: usize,
}

impl CatalogGraph {
    #[must_use]
    pub fn get(&self, kind: EntityKind, name: &str) -> Option<&Entity> {
        self.entities.get(&EntityKey::new(kind, name))
    }

    #[must_use]
    pub fn counts_by_kind(&self) -> BTreeMap<EntityKind, usize> {
        let mut counts = BTreeMap::new();
        for key in self.entities.keys() {
            *counts.entry(key.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn entities_of(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .filter(move |(key, _)| key.kind == kind)
            .map(|(_, entity)| entity)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CatalogCompiler {
    tables: ClassificationTables,
}

impl CatalogCompiler {
    #[must_use]
    pub fn new(tables: ClassificationTables) -> Self {
        Self { tables }
    }

    #[must_use]
    pub fn tables(&self) -> &ClassificationTables {
        &self.tables
    }

    /// Scope, classify and relate one parsed diagram.
    #[must_use]
    pub fn compile_file(&self, parsed: &ParseResult, source_name: &str) -> FileCatalog {
        let diagram = &parsed.diagram;
        let mut diagnostics: Vec<Diagnostic> = parsed
            .warnings
            .iter()
            .map(|warning| {
                Diagnostic::warning(warning.clone())
                    .with_category(DiagnosticCategory::Input)
                    .with_source(source_name)
            })
            .collect();
        let mut entities = EntityGraph::new();
        let mut ids: FxHashMap<&str, EntityKey> = FxHashMap::default();

        for boundary in diagram
            .boundaries
            .iter()
            .filter(|boundary| boundary.level == fc_core::BoundaryLevel::System)
        {
            let (name, domain) = system_name(&boundary.label, &boundary.source_id);
            let system = Entity::new(name, EntitySpec::System { domain });
            ids.insert(boundary.source_id.as_str(), system.key());
            insert_entity(&mut entities, system);
        }

        for node in &diagram.nodes {
            let Some((class, rule)) =
                classify(&self.tables, &node.declared_kind, &node.declared_technology)
            else {
                let err = CatalogError::UnclassifiableElement {
                    element: node.source_id.clone(),
                    declared_kind: node.declared_kind.clone(),
                };
                warn!(file = source_name, source_id = %node.source_id, "{err}");
                diagnostics.push(
                    Diagnostic::warning(err.to_string())
                        .with_category(DiagnosticCategory::Classification)
                        .with_source(source_name)
                        .with_element(&node.source_id)
                        .with_suggestion(
                            "Use a C4 element kind or an infrastructure technology",
                        ),
                );
                continue;
            };

            let scope = resolve_scope(node, diagram);
            let name = entity_name(node, &scope, &self.tables);
            if normalize(&node.declared_name).is_empty() {
                diagnostics.push(
                    Diagnostic::info(format!(
                        "Element {} has no name; synthesized '{name}'",
                        node.source_id
                    ))
                    .with_category(DiagnosticCategory::Scope)
                    .with_source(source_name)
                    .with_element(&node.source_id),
                );
            }
            let spec = match class {
                EntityClass::Component(subtype) => {
                    // Services drawn inside a container boundary are parts of that container.
                    let subtype = match subtype {
                        ComponentType::Service if scope.container.is_some() => {
                            ComponentType::Library
                        }
                        other => other,
                    };
                    EntitySpec::Component {
                        subtype,
                        system: scope.system.clone(),
                        container: if subtype == ComponentType::Library {
                            scope.container.clone()
                        } else {
                            None
                        },
                    }
                }
                EntityClass::Resource(subtype) => EntitySpec::Resource {
                    subtype,
                    system: scope.system.clone(),
                },
                EntityClass::User => EntitySpec::User,
            };
            let entity = Entity::new(name, spec)
                .with_description(node.declared_description.trim())
                .with_technology(self.tables.standardize(&node.declared_technology));
            debug!(
                file = source_name,
                source_id = %node.source_id,
                kind = entity.kind().as_str(),
                name = %entity.name,
                rule,
                "classified element"
            );
            ids.insert(node.source_id.as_str(), entity.key());
            insert_entity(&mut entities, entity);
        }

        for edge in &diagram.edges {
            let endpoints = (
                ids.get(edge.source_id.as_str()).cloned(),
                ids.get(edge.target_id.as_str()).cloned(),
            );
            let (Some(source), Some(target)) = endpoints else {
                diagnostics.push(
                    Diagnostic::warning(format!(
                        "Relationship {} -> {} references an element that is not in the catalog; skipped",
                        edge.source_id, edge.target_id
                    ))
                    .with_category(DiagnosticCategory::Relationship)
                    .with_source(source_name),
                );
                continue;
            };
            if source == target {
                diagnostics.push(
                    Diagnostic::info(format!("Dropped self-referencing relationship on {source}"))
                        .with_category(DiagnosticCategory::Relationship)
                        .with_source(source_name)
                        .with_element(&edge.source_id),
                );
                continue;
            }
            if source.kind == EntityKind::User || target.kind == EntityKind::User {
                diagnostics.push(
                    Diagnostic::info(format!(
                        "Dropped relationship {source} -> {target}: users take no part in the dependency graph"
                    ))
                    .with_category(DiagnosticCategory::Relationship)
                    .with_source(source_name),
                );
                continue;
            }

            match classify_relationship(
                &self.tables,
                &edge.declared_description,
                &edge.declared_technology,
                &target.name,
            ) {
                EdgeClass::Api { name, subtype } => {
                    let system = entities.get(&target).and_then(|provider| match provider.spec {
                        EntitySpec::System { .. } => Some(provider.name.clone()),
                        _ => provider.spec.system().map(str::to_string),
                    });
                    let api = Entity::new(name, EntitySpec::Api { subtype, system })
                        .with_description(edge.declared_description.trim())
                        .with_technology(edge.declared_technology.trim());
                    let api_key = api.key();
                    debug!(file = source_name, api = %api_key, "synthesized api");
                    insert_entity(&mut entities, api);
                    add_relation(&mut entities, &target, RelationKind::ProvidesApi, api_key.clone());
                    add_relation(&mut entities, &source, RelationKind::ConsumesApi, api_key);
                }
                EdgeClass::Dependency => {
                    add_relation(&mut entities, &source, RelationKind::DependsOn, target);
                }
            }
        }

        FileCatalog {
            source_name: source_name.to_string(),
            entities,
            diagnostics,
        }
    }

    /// One-time post-merge pass: group and domain synthesis, tag refinement
    /// and edge invariants.
    #[must_use]
    pub fn finalize(&self, graph: EntityGraph, config: &RunConfig) -> CatalogGraph {
        let mut entities = graph;
        let mut diagnostics = Vec::new();

        let group = Entity::new(
            config.group_name(),
            EntitySpec::Group {
                subtype: GroupType::Team,
            },
        )
        .with_description(format!("Team {}", config.team_name.trim()));
        insert_entity(&mut entities, group);

        let owner_key = EntityKey::new(
            EntityKind::Group,
            config
                .owner_ref()
                .trim_start_matches("group:")
                .to_string(),
        );
        if !entities.contains_key(&owner_key) {
            diagnostics.push(
                Diagnostic::info(format!(
                    "Owner {owner_key} is not defined by this catalog"
                ))
                .with_category(DiagnosticCategory::Merge),
            );
        }

        let domains: BTreeSet<String> = entities
            .values()
            .filter_map(|entity| entity.spec.domain().map(str::to_string))
            .collect();
        for domain in domains {
            let entity = Entity::new(domain.clone(), EntitySpec::Domain)
                .with_description(format!("Domain for {domain}"));
            entities.entry(entity.key()).or_insert(entity);
        }

        for entity in entities.values_mut() {
            refine(entity);
        }

        enforce_edge_invariants(&mut entities, &mut diagnostics);
        info!(entities = entities.len(), "finalized catalog graph");

        CatalogGraph {
            entities,
            diagnostics,
            files_seen: 0,
            files_skipped: 0,
        }
    }

    /// Parse, compile and fold every input in order, then finalize.
    ///
    /// Malformed files are skipped with an error diagnostic; fatal parse
    /// errors abort the run. Zero inputs or zero entities fail the run.
    pub fn compile_all<'a, I>(
        &self,
        inputs: I,
        config: &RunConfig,
    ) -> Result<CatalogGraph, CatalogError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        config.validate()?;

        let mut acc = EntityGraph::new();
        let mut diagnostics = Vec::new();
        let mut files_seen = 0;
        let mut files_skipped = 0;

        for (source_name, contents) in inputs {
            files_seen += 1;
            match fc_parser::parse(contents, source_name) {
                Ok(parsed) => {
                    let file = self.compile_file(&parsed, source_name);
                    info!(
                        file = source_name,
                        format = parsed.diagram.format.as_str(),
                        entities = file.entities.len(),
                        "compiled diagram"
                    );
                    diagnostics.extend(file.diagnostics);
                    acc = merge(acc, file.entities);
                }
                Err(err) if err.code().is_fatal() => return Err(err),
                Err(err) => {
                    warn!(file = source_name, code = err.code().as_str(), "skipping diagram: {err}");
                    files_skipped += 1;
                    diagnostics.push(
                        Diagnostic::error(err.to_string())
                            .with_category(DiagnosticCategory::Input)
                            .with_source(source_name),
                    );
                }
            }
        }

        if files_seen == 0 {
            return Err(CatalogError::empty("no diagram files were found"));
        }
        if acc.is_empty() {
            return Err(CatalogError::empty(format!(
                "no entities were produced from {files_seen} diagram file(s)"
            )));
        }

        let mut graph = self.finalize(acc, config);
        diagnostics.append(&mut graph.diagnostics);
        graph.diagnostics = diagnostics;
        graph.files_seen = files_seen;
        graph.files_skipped = files_skipped;
        Ok(graph)
    }
}

fn insert_entity(entities: &mut EntityGraph, entity: Entity) {
    match entities.entry(entity.key()) {
        Entry::Vacant(slot) => {
            slot.insert(entity);
        }
        Entry::Occupied(mut slot) => merge_entity(slot.get_mut(), entity),
    }
}

fn add_relation(
    entities: &mut EntityGraph,
    owner: &EntityKey,
    relation: RelationKind,
    target: EntityKey,
) {
    if let Some(entity) = entities.get_mut(owner) {
        entity.relations.get_mut(relation).insert(target);
    }
}

/// Drop self-loops and user edges; report references to missing entities.
fn enforce_edge_invariants(entities: &mut EntityGraph, diagnostics: &mut Vec<Diagnostic>) {
    let known: BTreeSet<EntityKey> = entities.keys().cloned().collect();
    for (key, entity) in entities.iter_mut() {
        for relation in [
            RelationKind::DependsOn,
            RelationKind::ProvidesApi,
            RelationKind::ConsumesApi,
        ] {
            let targets = entity.relations.get_mut(relation);
            let before = targets.len();
            targets.retain(|target| {
                target != key && target.kind != EntityKind::User && key.kind != EntityKind::User
            });
            if targets.len() != before {
                diagnostics.push(
                    Diagnostic::warning(format!(
                        "Removed {} {} edge(s) from {key} that formed self-loops or touched a user",
                        before - targets.len(),
                        relation.as_str()
                    ))
                    .with_category(DiagnosticCategory::Merge),
                );
            }
            for target in targets.iter().filter(|target| !known.contains(*target)) {
                diagnostics.push(
                    Diagnostic::warning(format!("{key} {} {target}, which is not in the catalog", relation.as_str()))
                        .with_category(DiagnosticCategory::Merge),
                );
            }
        }
    }
}
