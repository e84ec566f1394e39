//! Schema and query model for graphlayer.
//!
//! This crate provides:
//! - `schema`: Object, interface, enum and input object types
//! - `query`: Immutable queries and argument binding
//! - `json`: Conversion of results into JSON values

pub mod json;
pub mod query;
pub mod schema;

pub use query::{key, Args, FieldQuery, FieldQueryBuilder, ObjectQuery, Query, QueryKind, TypeKey, TypeShape};
pub use schema::{
    EnumType, Field, FieldRef, InputField, InputObject, InputObjectType, InputValue, ObjectKind,
    ObjectRef, ObjectType, Param, ScalarKind, ScalarType, Schema, SchemaBuilder, TypeDef, TypeRef,
};
