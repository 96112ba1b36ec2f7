//! Order-insensitive merge of per-file entity graphs.
//!
//! Every conflict rule is a commutative choice, so folding files in any
//! order yields the same graph.

use std::cmp::Ordering;

use fc_core::{Entity, EntityGraph, EntitySpec};

/// Fold one file's entities into the accumulator.
#[must_use]
pub fn merge(mut acc: EntityGraph, file: EntityGraph) -> EntityGraph {
    for (key, incoming) in file {
        match acc.get_mut(&key) {
            Some(existing) => merge_entity(existing, incoming),
            None => {
                acc.insert(key, incoming);
            }
        }
    }
    acc
}

/// Reconcile a repeated `(kind, name)`.
///
/// - description: longer wins; equal lengths keep the smaller string
/// - optional scalars: fill when absent, smaller value on disagreement
/// - relations and tags: set union
pub fn merge_entity(existing: &mut Entity, incoming: Entity) {
    existing.description = pick_description(
        std::mem::take(&mut existing.description),
        incoming.description,
    );
    existing.technology = pick_option(existing.technology.take(), incoming.technology);
    merge_spec(&mut existing.spec, incoming.spec);
    existing.relations.union_with(&incoming.relations);
    for tag in incoming.tags {
        if !existing.tags.contains(&tag) {
            existing.tags.push(tag);
        }
    }
    existing.tags.sort();
}

fn pick_description(current: String, incoming: String) -> String {
    match incoming.len().cmp(&current.len()) {
        Ordering::Greater => incoming,
        Ordering::Less => current,
        Ordering::Equal => current.min(incoming),
    }
}

fn pick_option<T: Ord>(current: Option<T>, incoming: Option<T>) -> Option<T> {
    match (current, incoming) {
        (Some(current), Some(incoming)) => Some(current.min(incoming)),
        (current, incoming) => current.or(incoming),
    }
}

fn merge_spec(existing: &mut EntitySpec, incoming: EntitySpec) {
    match (existing, incoming) {
        (EntitySpec::System { domain }, EntitySpec::System { domain: other }) => {
            *domain = pick_option(domain.take(), other);
        }
        (
            EntitySpec::Component {
                subtype,
                system,
                container,
            },
            EntitySpec::Component {
                subtype: other_subtype,
                system: other_system,
                container: other_container,
            },
        ) => {
            *subtype = (*subtype).min(other_subtype);
            *system = pick_option(system.take(), other_system);
            *container = pick_option(container.take(), other_container);
        }
        (
            EntitySpec::Resource { subtype, system },
            EntitySpec::Resource {
                subtype: other_subtype,
                system: other_system,
            },
        ) => {
            *subtype = (*subtype).min(other_subtype);
            *system = pick_option(system.take(), other_system);
        }
        (
            EntitySpec::Api { subtype, system },
            EntitySpec::Api {
                subtype: other_subtype,
                system: other_system,
            },
        ) => {
            *subtype = (*subtype).min(other_subtype);
            *system = pick_option(system.take(), other_system);
        }
        // Same key means same kind; the remaining pairs carry nothing to reconcile.
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use fc_core::{
        ComponentType, Entity, EntityGraph, EntityKey, EntityKind, EntitySpec, ResourceType,
    };
    use proptest::prelude::*;

    use super::{merge, merge_entity};

    fn service(name: &str, description: &str) -> Entity {
        Entity::new(
            name,
            EntitySpec::Component {
                subtype: ComponentType::Service,
                system: None,
                container: None,
            },
        )
        .with_description(description)
    }

    fn graph_of(entities: Vec<Entity>) -> EntityGraph {
        entities
            .into_iter()
            .map(|entity| (entity.key(), entity))
            .collect()
    }

    #[test]
    fn longer_description_wins() {
        let short = graph_of(vec![service("auth-service", "Short text")]);
        let long = graph_of(vec![service(
            "auth-service",
            "A much longer description of the service",
        )]);
        let merged = merge(short, long);
        let entity = &merged[&EntityKey::new(EntityKind::Component, "auth-service")];
        assert_eq!(entity.description.len(), 40);
    }

    #[test]
    fn technology_and_scope_fill_when_absent() {
        let mut existing = Entity::new(
            "orders-db",
            EntitySpec::Resource {
                subtype: ResourceType::Database,
                system: None,
            },
        );
        let incoming = Entity::new(
            "orders-db",
            EntitySpec::Resource {
                subtype: ResourceType::Database,
                system: Some("orders".to_string()),
            },
        )
        .with_technology("PostgreSQL");
        merge_entity(&mut existing, incoming);
        assert_eq!(existing.technology.as_deref(), Some("PostgreSQL"));
        assert_eq!(existing.spec.system(), Some("orders"));
    }

    #[test]
    fn system_domains_fill_when_absent() {
        let mut existing = Entity::new("billing", EntitySpec::System { domain: None });
        merge_entity(
            &mut existing,
            Entity::new(
                "billing",
                EntitySpec::System {
                    domain: Some("finance".to_string()),
                },
            ),
        );
        assert_eq!(existing.spec.domain(), Some("finance"));
    }

    #[test]
    fn relations_union() {
        let mut a = service("web", "");
        a.relations
            .depends_on
            .insert(EntityKey::new(EntityKind::Resource, "db"));
        let mut b = service("web", "");
        b.relations
            .depends_on
            .insert(EntityKey::new(EntityKind::Component, "auth"));
        b.relations
            .depends_on
            .insert(EntityKey::new(EntityKind::Resource, "db"));
        merge_entity(&mut a, b);
        assert_eq!(a.relations.depends_on.len(), 2);
    }

    fn arb_entity() -> impl Strategy<Value = Entity> {
        (
            prop::sample::select(vec!["auth", "orders", "billing"]),
            "[a-z ]{0,12}",
            prop::option::of(prop::sample::select(vec!["Java", "Go", "PostgreSQL"])),
            prop::option::of(prop::sample::select(vec!["shop", "finance"])),
            prop::sample::select(vec![ComponentType::Service, ComponentType::Library]),
            prop::collection::vec(prop::sample::select(vec!["db", "cache", "queue"]), 0..3),
        )
            .prop_map(|(name, description, technology, system, subtype, deps)| {
                let mut entity = Entity::new(
                    name,
                    EntitySpec::Component {
                        subtype,
                        system: system.map(str::to_string),
                        container: None,
                    },
                )
                .with_description(description);
                entity.technology = technology.map(str::to_string);
                for dep in deps {
                    entity
                        .relations
                        .depends_on
                        .insert(EntityKey::new(EntityKind::Resource, dep));
                }
                entity
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn merge_is_order_insensitive(
            first in prop::collection::vec(arb_entity(), 0..6),
            second in prop::collection::vec(arb_entity(), 0..6),
        ) {
            let a = first.into_iter().fold(EntityGraph::new(), |acc, e| merge(acc, graph_of(vec![e])));
            let b = second.into_iter().fold(EntityGraph::new(), |acc, e| merge(acc, graph_of(vec![e])));
            let ab = merge(merge(EntityGraph::new(), a.clone()), b.clone());
            let ba = merge(merge(EntityGraph::new(), b), a);
            prop_assert_eq!(ab, ba);
        }
    }
}
