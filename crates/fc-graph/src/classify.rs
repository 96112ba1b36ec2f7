//! Entity classification: declared C4 kind plus technology → catalog kind.
//!
//! Rules are evaluated top to bottom; the first rule whose kind pattern
//! matches and which yields a class wins. Nodes no rule accepts are
//! unclassifiable.

use fc_core::{ComponentType, ResourceType};

use crate::tables::ClassificationTables;

/// Catalog class of a declared diagram element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityClass {
    Component(ComponentType),
    Resource(ResourceType),
    User,
}

struct ClassificationRule {
    name: &'static str,
    /// Tested against the lowercased, trimmed declared kind.
    applies: fn(&str) -> bool,
    decide: fn(&ClassificationTables, &str, &str) -> Option<EntityClass>,
}

const RULES: &[ClassificationRule] = &[
    ClassificationRule {
        name: "software-system",
        applies: |kind| kind == "software system",
        decide: |_, _, _| Some(EntityClass::Component(ComponentType::Service)),
    },
    ClassificationRule {
        name: "container",
        applies: |kind| matches!(kind, "container" | "containerdb" | "containerqueue"),
        decide: classify_container,
    },
    ClassificationRule {
        name: "component",
        applies: |kind| kind == "component",
        decide: |_, _, _| Some(EntityClass::Component(ComponentType::Library)),
    },
    ClassificationRule {
        name: "person",
        applies: |kind| kind == "person",
        decide: |_, _, _| Some(EntityClass::User),
    },
    ClassificationRule {
        name: "database",
        applies: |kind| kind.ends_with("database"),
        decide: |_, _, _| Some(EntityClass::Resource(ResourceType::Database)),
    },
    ClassificationRule {
        name: "queue",
        applies: |kind| kind.ends_with("queue"),
        decide: |_, _, _| Some(EntityClass::Resource(ResourceType::MessageQueue)),
    },
    ClassificationRule {
        name: "infrastructure-fallback",
        applies: |_| true,
        decide: |tables, technology, _| {
            tables
                .is_infrastructure(technology)
                .then(|| EntityClass::Resource(infrastructure_subtype(tables, technology)))
        },
    },
];

fn infrastructure_subtype(tables: &ClassificationTables, technology: &str) -> ResourceType {
    tables
        .resource_family(technology)
        .unwrap_or(ResourceType::Infrastructure)
}

fn classify_container(
    tables: &ClassificationTables,
    technology: &str,
    kind: &str,
) -> Option<EntityClass> {
    let class = match kind {
        "containerdb" => EntityClass::Resource(
            tables
                .resource_family(technology)
                .unwrap_or(ResourceType::Database),
        ),
        "containerqueue" => EntityClass::Resource(
            tables
                .resource_family(technology)
                .unwrap_or(ResourceType::MessageQueue),
        ),
        _ if tables.is_infrastructure(technology) => {
            EntityClass::Resource(infrastructure_subtype(tables, technology))
        }
        _ if tables.is_frontend(technology) => EntityClass::Component(ComponentType::Website),
        _ => EntityClass::Component(ComponentType::Service),
    };
    Some(class)
}

/// Classify a declared element. `None` means no rule accepts it.
#[must_use]
pub fn classify(
    tables: &ClassificationTables,
    declared_kind: &str,
    technology: &str,
) -> Option<(EntityClass, &'static str)> {
    let kind = declared_kind.trim().to_lowercase();
    RULES
        .iter()
        .filter(|rule| (rule.applies)(&kind))
        .find_map(|rule| (rule.decide)(tables, technology, &kind).map(|class| (class, rule.name)))
}

#[cfg(test)]
mod tests {
    use fc_core::{ComponentType, ResourceType};

    use super::{EntityClass, classify};
    use crate::tables::ClassificationTables;

    fn class_of(kind: &str, technology: &str) -> Option<EntityClass> {
        classify(&ClassificationTables::default(), kind, technology).map(|(class, _)| class)
    }

    #[test]
    fn software_system_is_a_service() {
        assert_eq!(
            class_of("Software System", ""),
            Some(EntityClass::Component(ComponentType::Service))
        );
    }

    #[test]
    fn containers_split_by_technology() {
        assert_eq!(
            class_of("Container", "PostgreSQL"),
            Some(EntityClass::Resource(ResourceType::Database))
        );
        assert_eq!(
            class_of("Container", "Apache Kafka"),
            Some(EntityClass::Resource(ResourceType::MessageQueue))
        );
        assert_eq!(
            class_of("Container", "vault"),
            Some(EntityClass::Resource(ResourceType::KeyVault))
        );
        assert_eq!(
            class_of("Container", "S3"),
            Some(EntityClass::Resource(ResourceType::Infrastructure))
        );
        assert_eq!(
            class_of("Container", "React"),
            Some(EntityClass::Component(ComponentType::Website))
        );
        assert_eq!(
            class_of("Container", "Spring Boot"),
            Some(EntityClass::Component(ComponentType::Service))
        );
    }

    #[test]
    fn container_db_is_always_a_resource() {
        assert_eq!(
            class_of("ContainerDb", "Oracle"),
            Some(EntityClass::Resource(ResourceType::Database))
        );
        assert_eq!(
            class_of("ContainerDb", "kafka"),
            Some(EntityClass::Resource(ResourceType::MessageQueue))
        );
        assert_eq!(
            class_of("ContainerQueue", ""),
            Some(EntityClass::Resource(ResourceType::MessageQueue))
        );
    }

    #[test]
    fn components_people_and_databases() {
        assert_eq!(
            class_of("Component", "Spring"),
            Some(EntityClass::Component(ComponentType::Library))
        );
        assert_eq!(class_of("Person", ""), Some(EntityClass::User));
        assert_eq!(
            class_of("Software System Database", ""),
            Some(EntityClass::Resource(ResourceType::Database))
        );
        assert_eq!(
            class_of("Component Queue", ""),
            Some(EntityClass::Resource(ResourceType::MessageQueue))
        );
    }

    #[test]
    fn unknown_kinds_fall_back_to_infrastructure_or_nothing() {
        assert_eq!(
            class_of("Deployment Node", "redis"),
            Some(EntityClass::Resource(ResourceType::Database))
        );
        assert_eq!(class_of("Deployment Node", "Kubernetes"), None);
        assert_eq!(class_of("", ""), None);
    }

    #[test]
    fn reports_the_matching_rule() {
        let tables = ClassificationTables::default();
        let (_, rule) = classify(&tables, "Person", "").expect("classified");
        assert_eq!(rule, "person");
    }
}
