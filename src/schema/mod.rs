//! Schema collaborator.
//!
//! # Data Flow
//! ```text
//! application builds Schema (types, fields, resolvers)
//!     → instrument walks it through SchemaFields
//!     → exec.rs runs requests: root hook, then fields, concurrently per level
//! ```
//!
//! # Design Decisions
//! - Only what instrumentation needs: no parser, no validation, no input types
//! - Resolvers report outcomes as values (`Resolved`), never as duck-typed objects
//! - Schema identity is per instance; clones get a fresh identity

pub mod definition;
pub mod exec;
pub mod types;

pub use definition::{Field, FieldType, ObjectType, Schema, SchemaFields, SchemaId};
pub use exec::{execute, ExecutionResult, FieldError, Request, Selection};
pub use types::{
    DeferredValue, OperationInfo, PathSegment, ResolveContext, ResolveInfo, ResolveParams,
    ResolveResult, Resolved, Resolver, ResolverError, RootHook,
};
