#![forbid(unsafe_code)]

//! Shared data model for the FrankenCatalog pipeline: raw diagram records,
//! the catalog entity graph, diagnostics, errors, and run configuration.

mod config;
mod diagnostics;
mod entity;
mod error;
mod normalize;
mod raw;

pub use config::{
    DEFAULT_LIFECYCLE, DEFAULT_NAMESPACE, DEFAULT_REPO_SLUG, DEFAULT_TEAM_NAME, RunConfig,
};
pub use diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticCounts, DiagnosticSeverity};
pub use entity::{
    ApiType, ComponentType, Entity, EntityGraph, EntityKey, EntityKind, EntitySpec, GroupType,
    RelationKind, Relations, ResourceType,
};
pub use error::{CatalogError, CatalogErrorCode};
pub use normalize::normalize;
pub use raw::{BoundaryLevel, DiagramFormat, RawBoundary, RawDiagram, RawEdge, RawNode};
