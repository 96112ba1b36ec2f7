#![forbid(unsafe_code)]

//! Catalog emitter: renders a finalized [`CatalogGraph`] into
//! Backstage-style YAML documents.
//!
//! Emission is pure. It returns file paths and contents; writing them is
//! the caller's concern.

mod document;

use std::path::PathBuf;

use fc_core::{Entity, EntityKind, RunConfig};
use fc_graph::CatalogGraph;
use serde::Serialize;
use thiserror::Error;

pub use document::{
    API_VERSION, CatalogDocument, DocumentSpec, Metadata, PROJECT_SLUG_ANNOTATION, render_entity,
};

pub const BUNDLE_FILE_NAME: &str = "catalog-info.yaml";

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to serialize {kind} '{name}': {source}")]
    Serialize {
        kind: EntityKind,
        name: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// How documents are laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputLayout {
    /// One file per entity at `<kind>s/<name>.yaml`.
    #[default]
    Directory,
    /// Every document in one multi-document `catalog-info.yaml`.
    Bundle,
}

/// One output file, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmittedFile {
    pub relative_path: PathBuf,
    pub contents: String,
    pub documents: usize,
}

/// `<kind>s/<name>.yaml`
#[must_use]
pub fn entity_path(entity: &Entity) -> PathBuf {
    PathBuf::from(format!("{}s", entity.kind().as_str())).join(format!("{}.yaml", entity.name))
}

pub fn render_yaml(document: &CatalogDocument) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(document)
}

fn render(entity: &Entity, config: &RunConfig) -> Result<String, EmitError> {
    render_yaml(&render_entity(entity, config)).map_err(|source| EmitError::Serialize {
        kind: entity.kind(),
        name: entity.name.clone(),
        source,
    })
}

/// Render every entity of `graph` in the requested layout.
pub fn emit_catalog(
    graph: &CatalogGraph,
    config: &RunConfig,
    layout: OutputLayout,
) -> Result<Vec<EmittedFile>, EmitError> {
    match layout {
        OutputLayout::Directory => graph
            .entities
            .values()
            .map(|entity| -> Result<EmittedFile, EmitError> {
                Ok(EmittedFile {
                    relative_path: entity_path(entity),
                    contents: render(entity, config)?,
                    documents: 1,
                })
            })
            .collect(),
        OutputLayout::Bundle => {
            let mut contents = String::new();
            for entity in graph.entities.values() {
                contents.push_str("---\n");
                contents.push_str(&render(entity, config)?);
            }
            Ok(vec![EmittedFile {
                relative_path: PathBuf::from(BUNDLE_FILE_NAME),
                contents,
                documents: graph.entities.len(),
            }])
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use fc_core::{EntityKind, RunConfig};
    use fc_graph::{CatalogCompiler, CatalogGraph};

    use super::{BUNDLE_FILE_NAME, CatalogDocument, OutputLayout, emit_catalog};

    const SHOP: &str = r#"C4Container
Person(buyer, "Buyer", "Places orders")
System_Boundary(shop, "Shop, domain: commerce") {
    Container(orders, "Order Service", "Spring Boot", "Handles orders")
    Container(fulfil, "Fulfilment Service", "Go", "Ships orders")
    ContainerDb(odb, "Orders DB", "PostgreSQL", "Order storage")
}
Rel(buyer, orders, "Places orders", "HTTPS")
Rel(fulfil, orders, "fetch orders", "grpc")
Rel(orders, odb, "Reads and writes", "JDBC")
"#;

    fn graph() -> CatalogGraph {
        CatalogCompiler::default()
            .compile_all([("shop.mmd", SHOP)], &RunConfig::default())
            .expect("compile")
    }

    #[test]
    fn directory_layout_writes_one_file_per_entity() {
        let graph = graph();
        let files = emit_catalog(&graph, &RunConfig::default(), OutputLayout::Directory)
            .expect("emit");
        assert_eq!(files.len(), graph.entities.len());
        let paths: Vec<PathBuf> = files.iter().map(|f| f.relative_path.clone()).collect();
        assert!(paths.contains(&PathBuf::from("systems/shop.yaml")));
        assert!(paths.contains(&PathBuf::from("resources/orders-db.yaml")));
        assert!(paths.contains(&PathBuf::from("apis/api-fetch-orders.yaml")));
        assert!(paths.contains(&PathBuf::from("users/buyer.yaml")));
        assert!(paths.contains(&PathBuf::from("groups/team-a.yaml")));
        assert!(paths.contains(&PathBuf::from("domains/commerce.yaml")));
        assert!(files.iter().all(|f| !f.contents.trim().is_empty()));
    }

    #[test]
    fn documents_round_trip_through_yaml() {
        let graph = graph();
        let files = emit_catalog(&graph, &RunConfig::default(), OutputLayout::Directory)
            .expect("emit");
        let service = files
            .iter()
            .find(|f| f.relative_path == PathBuf::from("components/order-service.yaml"))
            .expect("service file");
        let document: CatalogDocument =
            serde_yaml::from_str(&service.contents).expect("valid yaml");
        assert_eq!(document.kind, "Component");
        assert_eq!(document.spec.entity_type.as_deref(), Some("service"));
        assert_eq!(document.spec.system.as_deref(), Some("shop"));
        assert_eq!(
            document.spec.provides_apis,
            vec!["api:api-fetch-orders".to_string()]
        );
        assert_eq!(
            document.spec.depends_on,
            vec!["resource:orders-db".to_string()]
        );
        assert!(service.contents.contains("type: service"));
        assert!(!service.contents.contains("domain:"));
    }

    #[test]
    fn bundle_layout_writes_a_multi_document_file() {
        let graph = graph();
        let files =
            emit_catalog(&graph, &RunConfig::default(), OutputLayout::Bundle).expect("emit");
        assert_eq!(files.len(), 1);
        let bundle = &files[0];
        assert_eq!(bundle.relative_path, PathBuf::from(BUNDLE_FILE_NAME));
        assert_eq!(bundle.documents, graph.entities.len());
        assert_eq!(
            bundle.contents.matches("---\n").count(),
            graph.entities.len()
        );
        let kinds: Vec<String> = serde_yaml::Deserializer::from_str(&bundle.contents)
            .map(|doc| {
                let document: CatalogDocument =
                    serde::Deserialize::deserialize(doc).expect("document");
                document.kind
            })
            .collect();
        assert_eq!(kinds.len(), graph.entities.len());
        assert!(kinds.iter().any(|kind| kind == "API"));
    }

    #[test]
    fn user_documents_are_minimal() {
        let graph = graph();
        let buyer = graph.get(EntityKind::User, "buyer").expect("buyer");
        let yaml = super::render_yaml(&super::render_entity(buyer, &RunConfig::default()))
            .expect("yaml");
        assert!(!yaml.contains("owner"));
        assert!(!yaml.contains("annotations"));
        assert!(yaml.contains("description: Places orders"));
    }
}
