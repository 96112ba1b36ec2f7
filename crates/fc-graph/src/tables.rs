//! Classification tables consulted by the entity and relationship
//! classifiers.
//!
//! Tables are plain data handed to [`crate::CatalogCompiler`] at
//! construction. `Default` carries the built-in vocabulary; a config file
//! may replace any table wholesale.

use std::collections::{BTreeMap, BTreeSet};

use fc_core::{ApiType, ResourceType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationTables {
    /// Technologies that make a container an infrastructure resource.
    pub infrastructure: BTreeSet<String>,
    pub database_family: BTreeSet<String>,
    pub message_queue_family: BTreeSet<String>,
    pub key_vault_family: BTreeSet<String>,
    /// UI framework tokens that turn a container into a website.
    pub frontend: BTreeSet<String>,
    /// Edge technology → API subtype. Membership marks an API interaction.
    pub api_technologies: BTreeMap<String, ApiType>,
    /// Lowercase technology token → canonical display form.
    pub standard_names: BTreeMap<String, String>,
}

fn set_of(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|item| (*item).to_string()).collect()
}

impl Default for ClassificationTables {
    fn default() -> Self {
        let api_technologies = [
            ("json/http", ApiType::OpenApi),
            ("http/json", ApiType::OpenApi),
            ("raml", ApiType::OpenApi),
            ("grpc", ApiType::Grpc),
            ("graphql", ApiType::GraphQl),
            ("soap", ApiType::Soap),
            ("wsdl", ApiType::Soap),
            ("websocket", ApiType::WebSocket),
            ("odata", ApiType::OData),
        ]
        .into_iter()
        .map(|(token, api_type)| (token.to_string(), api_type))
        .collect();

        let standard_names = [
            ("postgres", "PostgreSQL"),
            ("postgresql", "PostgreSQL"),
            ("redis", "Redis"),
            ("kafka", "Apache Kafka"),
            ("apache kafka", "Apache Kafka"),
            ("vault", "HashiCorp Vault"),
            ("hashicorp vault", "HashiCorp Vault"),
            ("hashcorp vault", "HashiCorp Vault"),
            ("mysql", "MySQL"),
            ("mongodb", "MongoDB"),
            ("spring", "Spring Framework"),
            ("spring boot", "Spring Boot"),
            ("react", "React"),
            ("angular", "Angular"),
            ("kong", "Kong"),
        ]
        .into_iter()
        .map(|(token, name)| (token.to_string(), name.to_string()))
        .collect();

        Self {
            infrastructure: set_of(&[
                "postgresql",
                "redis",
                "apache kafka",
                "hashicorp vault",
                "mysql",
                "mongodb",
                "s3",
                "sns",
                "sqs",
                "dynamodb",
                "elasticsearch",
                "rabbitmq",
                "activemq",
                "zeromq",
                "nats",
                "pubsub",
                "servicebus",
            ]),
            database_family: set_of(&[
                "postgresql",
                "mysql",
                "mongodb",
                "redis",
                "elasticsearch",
                "dynamodb",
            ]),
            message_queue_family: set_of(&[
                "apache kafka",
                "rabbitmq",
                "activemq",
                "zeromq",
                "nats",
                "pubsub",
                "servicebus",
                "sqs",
                "sns",
            ]),
            key_vault_family: set_of(&["hashicorp vault"]),
            frontend: set_of(&["react", "angular", "vue"]),
            api_technologies,
            standard_names,
        }
    }
}

impl ClassificationTables {
    /// Canonical display form of a technology label.
    ///
    /// Known tokens map through `standard_names`; anything else is
    /// title-cased word by word. Blank input stays blank.
    #[must_use]
    pub fn standardize(&self, technology: &str) -> String {
        let trimmed = technology.trim();
        if trimmed.is_empty() {
            return String::new();
        }
        self.standard_names
            .get(&trimmed.to_lowercase())
            .cloned()
            .unwrap_or_else(|| title_case(trimmed))
    }

    /// Lowercased raw and standardized forms, the keys every set test uses.
    fn lookup_forms(&self, technology: &str) -> [String; 2] {
        [
            technology.trim().to_lowercase(),
            self.standardize(technology).to_lowercase(),
        ]
    }

    fn any_form_in(&self, set: &BTreeSet<String>, technology: &str) -> bool {
        self.lookup_forms(technology)
            .iter()
            .any(|form| !form.is_empty() && set.contains(form))
    }

    #[must_use]
    pub fn is_infrastructure(&self, technology: &str) -> bool {
        self.any_form_in(&self.infrastructure, technology)
    }

    #[must_use]
    pub fn is_frontend(&self, technology: &str) -> bool {
        self.any_form_in(&self.frontend, technology)
    }

    /// Resource subtype by technology family, if the technology belongs to one.
    #[must_use]
    pub fn resource_family(&self, technology: &str) -> Option<ResourceType> {
        if self.any_form_in(&self.database_family, technology) {
            Some(ResourceType::Database)
        } else if self.any_form_in(&self.message_queue_family, technology) {
            Some(ResourceType::MessageQueue)
        } else if self.any_form_in(&self.key_vault_family, technology) {
            Some(ResourceType::KeyVault)
        } else {
            None
        }
    }

    /// API subtype for an edge technology, or `None` for a plain dependency.
    #[must_use]
    pub fn api_type(&self, technology: &str) -> Option<ApiType> {
        let token = technology.trim().to_lowercase();
        self.api_technologies.get(&token).copied()
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
