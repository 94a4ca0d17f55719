//! Reflective GraphQL schema derivation. Describe plain structs once, tag
//! the fields that need graph-specific treatment, register resolvers where
//! stored data is not enough, and assemble an executable schema. Relay
//! connections are synthesized for any field tagged for pagination.

// Lets derive-generated `::structql` paths resolve inside this crate's own
// tests and docs.
extern crate self as structql;

pub(crate) mod builder;
pub mod context;
pub mod error;
pub mod pagination;
pub mod reflect;
pub mod resolver;
pub mod schema;
pub mod value;

pub use async_graphql_value::ConstValue;
pub use builder::registry::CursorCodec;
pub use context::{Ctx, RequestMetadata};
pub use error::{Error, ResolveError, Result, SchemaError};
pub use pagination::PageArguments;
pub use reflect::{FieldSpec, Reflect, ReflectEnum, Resolvers, Shape, TypeSpec};
pub use resolver::{ResolverMap, ResolverTable};
pub use schema::{BuiltSchema, SchemaBuilder};
pub use value::{FromConstValue, GraphValue, Id, ToConstValue};

pub use structql_macros::{Reflect, ReflectEnum};

#[doc(hidden)]
pub mod __private {
    pub use async_graphql::Name;
    pub use indexmap::IndexMap;
}
