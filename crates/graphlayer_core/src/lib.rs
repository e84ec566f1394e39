//! Core types for graphlayer.
//!
//! This crate provides the types shared by every other graphlayer crate:
//! - `value`: Dynamic result and argument values
//! - `error`: Schema and resolution errors

pub mod error;
pub mod value;

pub use error::{GraphError, GraphResult, SchemaError, SchemaResult};
pub use value::{FromValue, Object, Value};
