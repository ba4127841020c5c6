//! # typegraph-compose
//!
//! Programmatic construction of GraphQL type graphs.
//!
//! Types are built, modified, cloned and wired together through mutable
//! composers that live in a shared registry, then turned into an executable
//! `async-graphql` dynamic schema. It supports:
//!
//! - Object, input, enum, scalar, interface and union composers
//! - Forward and circular references through deferred type references
//! - Definitions as SDL text, type strings or configs
//! - Resolvers as reusable field generators with wrapping, cloning, filter
//!   and sort arguments and middleware
//! - Pruning of types that end up without fields
//!
//! ## Overview
//!
//! ```ignore
//! use typegraph_compose::prelude::*;
//!
//! let sc = SchemaComposer::new();
//! sc.create_object_tc("type User { id: ID! name: String }")?;
//! sc.query()?.add_fields([("me", "User")])?;
//!
//! let schema = sc.build()?;
//! ```
//!
//! ## Configuration
//!
//! ```toml
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! prune_empty_types = true
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Configuration options
//! - [`composers`] - Named type composers
//! - [`mapper`] - Definitions and their conversion into composers
//! - [`resolver`] - Resolvers and resolve-time parameters
//! - [`schema`] - The schema composer and schema building
//! - [`error`] - Error types

pub mod composers;
pub mod config;
pub mod error;
pub mod extensions;
pub mod mapper;
pub mod names;
pub mod resolver;
pub mod schema;
pub mod storage;
pub mod type_ref;
pub mod value;

// Re-export main types
pub use composers::{
    ArgumentConfig, EnumTypeComposer, EnumValueConfig, FieldConfig, InputTypeComposer,
    InterfaceTypeComposer, NamedTypeComposer, ObjectTypeComposer, ScalarTypeComposer,
    UnionTypeComposer,
};
pub use config::ComposerConfig;
pub use error::ComposeError;
pub use resolver::{ResolveParams, Resolver, ResolverDefinition, resolve_fn};
pub use schema::{BuildOptions, DirectiveDefinition, SchemaComposer};
pub use type_ref::TypeReference;

/// Result type for composition operations.
pub type Result<T> = std::result::Result<T, ComposeError>;

/// Common imports.
pub mod prelude {
    pub use crate::composers::*;
    pub use crate::mapper::{
        ArgumentDefinition, FieldDefinition, InputFieldDefinition, ObjectTypeConfig, TypeDef,
    };
    pub use crate::resolver::{
        Projection, RequestContext, ResolveParams, Resolver, ResolverDefinition, resolve_fn,
        subscribe_fn,
    };
    pub use crate::{BuildOptions, ComposeError, ComposerConfig, SchemaComposer, TypeReference};
}
