//! Catalog entity graph model.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    System,
    #[default]
    Component,
    Resource,
    Api,
    User,
    Group,
    Domain,
}

impl EntityKind {
    pub const ALL: [Self; 7] = [
        Self::System,
        Self::Component,
        Self::Resource,
        Self::Api,
        Self::User,
        Self::Group,
        Self::Domain,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Component => "component",
            Self::Resource => "resource",
            Self::Api => "api",
            Self::User => "user",
            Self::Group => "group",
            Self::Domain => "domain",
        }
    }

    /// Capitalized form used as the catalog document `kind`.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::System => "System",
            Self::Component => "Component",
            Self::Resource => "Resource",
            Self::Api => "API",
            Self::User => "User",
            Self::Group => "Group",
            Self::Domain => "Domain",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Merge key and reference target: `(kind, canonical name)`.
///
/// Serialized as the catalog reference string `kind:name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct EntityKey {
    pub kind: EntityKind,
    pub name: String,
}

impl EntityKey {
    #[must_use]
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.name)
    }
}

impl FromStr for EntityKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (kind, name) = value
            .split_once(':')
            .ok_or_else(|| format!("entity reference '{value}' is missing a kind prefix"))?;
        let kind = EntityKind::parse(kind)
            .ok_or_else(|| format!("entity reference '{value}' has unknown kind '{kind}'"))?;
        if name.is_empty() {
            return Err(format!("entity reference '{value}' has an empty name"));
        }
        Ok(Self::new(kind, name))
    }
}

impl From<EntityKey> for String {
    fn from(key: EntityKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for EntityKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentType {
    #[default]
    Service,
    Library,
    Website,
}

impl ComponentType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Library => "library",
            Self::Website => "website",
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    #[default]
    Database,
    MessageQueue,
    KeyVault,
    Infrastructure,
}

impl ResourceType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::MessageQueue => "message-queue",
            Self::KeyVault => "key-vault",
            Self::Infrastructure => "infrastructure",
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ApiType {
    #[default]
    OpenApi,
    Grpc,
    GraphQl,
    Soap,
    WebSocket,
    OData,
}

impl ApiType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenApi => "openapi",
            Self::Grpc => "grpc",
            Self::GraphQl => "graphql",
            Self::Soap => "soap",
            Self::WebSocket => "websocket",
            Self::OData => "odata",
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum GroupType {
    #[default]
    Team,
}

impl GroupType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Team => "team",
        }
    }
}

/// Kind-specific fields. Scope fields are back-references by canonical
/// name, never ownership edges.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EntitySpec {
    System {
        domain: Option<String>,
    },
    Component {
        subtype: ComponentType,
        system: Option<String>,
        container: Option<String>,
    },
    Resource {
        subtype: ResourceType,
        system: Option<String>,
    },
    Api {
        subtype: ApiType,
        system: Option<String>,
    },
    User,
    Group {
        subtype: GroupType,
    },
    Domain,
}

impl EntitySpec {
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::System { .. } => EntityKind::System,
            Self::Component { .. } => EntityKind::Component,
            Self::Resource { .. } => EntityKind::Resource,
            Self::Api { .. } => EntityKind::Api,
            Self::User => EntityKind::User,
            Self::Group { .. } => EntityKind::Group,
            Self::Domain => EntityKind::Domain,
        }
    }

    #[must_use]
    pub const fn subtype(&self) -> Option<&'static str> {
        match self {
            Self::Component { subtype, .. } => Some(subtype.as_str()),
            Self::Resource { subtype, .. } => Some(subtype.as_str()),
            Self::Api { subtype, .. } => Some(subtype.as_str()),
            Self::Group { subtype } => Some(subtype.as_str()),
            Self::System { .. } | Self::User | Self::Domain => None,
        }
    }

    #[must_use]
    pub fn system(&self) -> Option<&str> {
        match self {
            Self::Component { system, .. }
            | Self::Resource { system, .. }
            | Self::Api { system, .. } => system.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        match self {
            Self::System { domain } => domain.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn container(&self) -> Option<&str> {
        match self {
            Self::Component { container, .. } => container.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationKind {
    DependsOn,
    ProvidesApi,
    ConsumesApi,
}

impl RelationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DependsOn => "dependsOn",
            Self::ProvidesApi => "providesApis",
            Self::ConsumesApi => "consumesApis",
        }
    }
}

/// Outgoing edges of one entity. Sets, so duplicate references collapse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Relations {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub depends_on: BTreeSet<EntityKey>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub provides_apis: BTreeSet<EntityKey>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub consumes_apis: BTreeSet<EntityKey>,
}

impl Relations {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.depends_on.is_empty() && self.provides_apis.is_empty() && self.consumes_apis.is_empty()
    }

    #[must_use]
    pub fn get(&self, relation: RelationKind) -> &BTreeSet<EntityKey> {
        match relation {
            RelationKind::DependsOn => &self.depends_on,
            RelationKind::ProvidesApi => &self.provides_apis,
            RelationKind::ConsumesApi => &self.consumes_apis,
        }
    }

    pub fn get_mut(&mut self, relation: RelationKind) -> &mut BTreeSet<EntityKey> {
        match relation {
            RelationKind::DependsOn => &mut self.depends_on,
            RelationKind::ProvidesApi => &mut self.provides_apis,
            RelationKind::ConsumesApi => &mut self.consumes_apis,
        }
    }

    /// Iterate every edge as `(relation, target)`.
    pub fn iter(&self) -> impl Iterator<Item = (RelationKind, &EntityKey)> {
        [
            RelationKind::DependsOn,
            RelationKind::ProvidesApi,
            RelationKind::ConsumesApi,
        ]
        .into_iter()
        .flat_map(move |relation| self.get(relation).iter().map(move |key| (relation, key)))
    }

    /// Set union of every relation.
    pub fn union_with(&mut self, other: &Self) {
        self.depends_on.extend(other.depends_on.iter().cloned());
        self.provides_apis
            .extend(other.provides_apis.iter().cloned());
        self.consumes_apis
            .extend(other.consumes_apis.iter().cloned());
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Entity {
    pub name: String,
    pub description: String,
    pub technology: Option<String>,
    pub tags: Vec<String>,
    pub spec: EntitySpec,
    #[serde(default)]
    pub relations: Relations,
}

impl Entity {
    #[must_use]
    pub fn new(name: impl Into<String>, spec: EntitySpec) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            technology: None,
            tags: Vec::new(),
            spec,
            relations: Relations::default(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the technology label; blank values leave it absent.
    #[must_use]
    pub fn with_technology(mut self, technology: impl Into<String>) -> Self {
        let technology = technology.into();
        self.technology = (!technology.trim().is_empty()).then_some(technology);
        self
    }

    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.spec.kind()
    }

    #[must_use]
    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.kind(), self.name.clone())
    }
}

/// Entities keyed by `(kind, name)`; iteration order is the key order.
pub type EntityGraph = BTreeMap<EntityKey, Entity>;

#[cfg(test)]
mod tests {
    use super::{
        ApiType, ComponentType, Entity, EntityKey, EntityKind, EntitySpec, RelationKind, Relations,
        ResourceType,
    };

    #[test]
    fn entity_key_round_trips_through_reference_string() {
        let key = EntityKey::new(EntityKind::Api, "api-fetch-orders");
        assert_eq!(key.to_string(), "api:api-fetch-orders");
        assert_eq!("api:api-fetch-orders".parse::<EntityKey>(), Ok(key));
    }

    #[test]
    fn entity_key_rejects_unknown_kinds() {
        assert!("widget:foo".parse::<EntityKey>().is_err());
        assert!("component".parse::<EntityKey>().is_err());
        assert!("component:".parse::<EntityKey>().is_err());
    }

    #[test]
    fn entity_key_serializes_as_reference_string() {
        let key = EntityKey::new(EntityKind::Resource, "orders-db");
        let json = serde_json::to_string(&key).expect("serialize key");
        assert_eq!(json, "\"resource:orders-db\"");
    }

    #[test]
    fn subtype_strings_match_catalog_vocabulary() {
        assert_eq!(ResourceType::MessageQueue.as_str(), "message-queue");
        assert_eq!(ResourceType::KeyVault.as_str(), "key-vault");
        assert_eq!(ApiType::GraphQl.as_str(), "graphql");
        assert_eq!(ComponentType::Website.as_str(), "website");
    }

    #[test]
    fn spec_accessors_expose_scope_fields() {
        let spec = EntitySpec::Component {
            subtype: ComponentType::Library,
            system: Some("billing".to_string()),
            container: Some("invoice-service".to_string()),
        };
        assert_eq!(spec.kind(), EntityKind::Component);
        assert_eq!(spec.subtype(), Some("library"));
        assert_eq!(spec.system(), Some("billing"));
        assert_eq!(spec.container(), Some("invoice-service"));
        assert_eq!(EntitySpec::User.subtype(), None);
    }

    #[test]
    fn blank_technology_stays_absent() {
        let entity = Entity::new("web", EntitySpec::User).with_technology("  ");
        assert_eq!(entity.technology, None);
    }

    #[test]
    fn relations_iterate_in_relation_order() {
        let mut relations = Relations::default();
        relations
            .consumes_apis
            .insert(EntityKey::new(EntityKind::Api, "api-a"));
        relations
            .depends_on
            .insert(EntityKey::new(EntityKind::Resource, "db"));
        let edges: Vec<_> = relations.iter().map(|(kind, _)| kind).collect();
        assert_eq!(
            edges,
            vec![RelationKind::DependsOn, RelationKind::ConsumesApi]
        );
    }
}
