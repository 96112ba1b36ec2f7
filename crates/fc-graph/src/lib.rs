#![forbid(unsafe_code)]

//! Entity graph compiler: scope resolution, classification, relationship
//! synthesis and the cross-file merge.

mod classify;
mod merge;
mod pipeline;
mod refine;
mod relations;
mod scope;
mod tables;

pub use classify::{EntityClass, classify};
pub use merge::{merge, merge_entity};
pub use pipeline::{CatalogCompiler, CatalogGraph, FileCatalog};
pub use refine::refine;
pub use relations::{EdgeClass, api_name, classify_relationship};
pub use scope::{DOMAIN_SEPARATOR, ResolvedScope, entity_name, resolve_scope, split_system_label};
pub use tables::ClassificationTables;
