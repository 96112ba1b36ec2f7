//! Backstage-style catalog documents.

use std::collections::{BTreeMap, BTreeSet};

use fc_core::{Entity, EntityKey, EntityKind, RunConfig};
use serde::{Deserialize, Serialize};

pub const API_VERSION: &str = "backstage.io/v1alpha1";
pub const PROJECT_SLUG_ANNOTATION: &str = "github.com/project-slug";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDocument {
    pub api_version: String,
    pub kind: String,
    pub metadata: Metadata,
    pub spec: DocumentSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    pub namespace: String,
    pub description: String,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Document `spec`. Field order is the emitted key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSpec {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provides_apis: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumes_apis: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology: Option<String>,
}

const fn has_lifecycle(kind: EntityKind) -> bool {
    matches!(
        kind,
        EntityKind::Component | EntityKind::Api | EntityKind::Resource
    )
}

const fn has_owner(kind: EntityKind) -> bool {
    !matches!(kind, EntityKind::User | EntityKind::Group)
}

const fn has_project_annotation(kind: EntityKind) -> bool {
    !matches!(kind, EntityKind::User | EntityKind::Domain)
}

/// Render one entity with the run's owner, lifecycle and repository slug.
#[must_use]
pub fn render_entity(entity: &Entity, config: &RunConfig) -> CatalogDocument {
    let kind = entity.kind();
    let mut annotations = BTreeMap::new();
    if has_project_annotation(kind) {
        annotations.insert(
            PROJECT_SLUG_ANNOTATION.to_string(),
            config.repo_slug.trim().to_string(),
        );
    }

    // Relation sets are ordered, so the lists come out sorted.
    let refs = |set: &BTreeSet<EntityKey>| {
        set.iter().map(ToString::to_string).collect::<Vec<_>>()
    };

    let spec = DocumentSpec {
        entity_type: entity.spec.subtype().map(str::to_string),
        owner: has_owner(kind).then(|| config.owner_ref()),
        lifecycle: has_lifecycle(kind).then(|| config.lifecycle.trim().to_string()),
        system: entity.spec.system().map(str::to_string),
        domain: entity.spec.domain().map(str::to_string),
        depends_on: refs(&entity.relations.depends_on),
        provides_apis: refs(&entity.relations.provides_apis),
        consumes_apis: refs(&entity.relations.consumes_apis),
        technology: entity
            .technology
            .clone()
            .filter(|_| kind != EntityKind::Api),
    };

    CatalogDocument {
        api_version: API_VERSION.to_string(),
        kind: kind.display_name().to_string(),
        metadata: Metadata {
            name: entity.name.clone(),
            namespace: config.namespace.trim().to_string(),
            description: entity.description.clone(),
            tags: entity.tags.clone(),
            annotations,
        },
        spec,
    }
}

#[cfg(test)]
mod tests {
    use fc_core::{
        ApiType, ComponentType, Entity, EntityKey, EntityKind, EntitySpec, GroupType, RunConfig,
    };

    use super::{PROJECT_SLUG_ANNOTATION, render_entity};

    fn config() -> RunConfig {
        RunConfig {
            team_name: "Platform Team".to_string(),
            repo_slug: "acme/shop".to_string(),
            ..RunConfig::default()
        }
    }

    #[test]
    fn component_documents_carry_every_applicable_field() {
        let mut entity = Entity::new(
            "order-service",
            EntitySpec::Component {
                subtype: ComponentType::Service,
                system: Some("shop".to_string()),
                container: None,
            },
        )
        .with_description("Handles orders")
        .with_technology("Spring Boot Service");
        entity.tags = vec!["spring-service".to_string()];
        entity
            .relations
            .depends_on
            .insert(EntityKey::new(EntityKind::Resource, "orders-db"));
        entity
            .relations
            .depends_on
            .insert(EntityKey::new(EntityKind::Component, "auth"));

        let document = render_entity(&entity, &config());
        assert_eq!(document.api_version, "backstage.io/v1alpha1");
        assert_eq!(document.kind, "Component");
        assert_eq!(document.metadata.namespace, "default");
        assert_eq!(
            document.metadata.annotations.get(PROJECT_SLUG_ANNOTATION),
            Some(&"acme/shop".to_string())
        );
        assert_eq!(document.spec.entity_type.as_deref(), Some("service"));
        assert_eq!(document.spec.owner.as_deref(), Some("group:platform-team"));
        assert_eq!(document.spec.lifecycle.as_deref(), Some("production"));
        assert_eq!(document.spec.system.as_deref(), Some("shop"));
        assert_eq!(
            document.spec.depends_on,
            vec![
                "component:auth".to_string(),
                "resource:orders-db".to_string()
            ]
        );
        assert_eq!(
            document.spec.technology.as_deref(),
            Some("Spring Boot Service")
        );
    }

    #[test]
    fn apis_omit_technology() {
        let api = Entity::new(
            "api-fetch-orders",
            EntitySpec::Api {
                subtype: ApiType::Grpc,
                system: None,
            },
        )
        .with_technology("grpc");
        let document = render_entity(&api, &config());
        assert_eq!(document.kind, "API");
        assert_eq!(document.spec.entity_type.as_deref(), Some("grpc"));
        assert!(document.spec.technology.is_none());
        assert!(document.spec.system.is_none());
    }

    #[test]
    fn users_and_domains_have_no_project_annotation() {
        let user = render_entity(&Entity::new("buyer", EntitySpec::User), &config());
        assert!(user.metadata.annotations.is_empty());
        assert!(user.spec.owner.is_none());
        assert!(user.spec.lifecycle.is_none());

        let domain = render_entity(&Entity::new("retail", EntitySpec::Domain), &config());
        assert!(domain.metadata.annotations.is_empty());
        assert_eq!(domain.spec.owner.as_deref(), Some("group:platform-team"));
    }

    #[test]
    fn groups_are_typed_teams_without_owner() {
        let group = render_entity(
            &Entity::new(
                "platform-team",
                EntitySpec::Group {
                    subtype: GroupType::Team,
                },
            ),
            &config(),
        );
        assert_eq!(group.kind, "Group");
        assert_eq!(group.spec.entity_type.as_deref(), Some("team"));
        assert!(group.spec.owner.is_none());
        assert!(group.spec.lifecycle.is_none());
    }

    #[test]
    fn systems_carry_their_domain() {
        let system = render_entity(
            &Entity::new(
                "billing",
                EntitySpec::System {
                    domain: Some("finance".to_string()),
                },
            ),
            &config(),
        );
        assert_eq!(system.spec.domain.as_deref(), Some("finance"));
        assert!(system.spec.entity_type.is_none());
        assert!(system.spec.lifecycle.is_none());
    }
}
