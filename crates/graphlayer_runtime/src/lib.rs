//! Resolution runtime for graphlayer.
//!
//! This crate provides:
//! - `expander`: Expanders, requests and expander groups
//! - `graph`: Graph definitions and the resolution engine
//! - `dependencies`: Dependency maps and injection
//! - `resolvers`: Root and constant object resolvers
//! - `object_builder`: Object results from source records
//! - `cardinality`: Single, optional and list projections
//! - `interfaces`: Interface queries resolved per implementation

pub mod cardinality;
pub mod dependencies;
pub mod expander;
pub mod graph;
pub mod interfaces;
pub mod object_builder;
pub mod resolvers;

pub use cardinality::Cardinality;
pub use dependencies::{Dependencies, DependencyKey, Injected};
pub use expander::{AsAny, ExpandFn, Expander, ExpanderGroup, Expanders, Request};
pub use graph::{define_graph, Graph, GraphDefinition};
pub use interfaces::{interface_list_resolver, resolve_implementations};
pub use object_builder::ObjectBuilder;
pub use resolvers::{constant_object_resolver, FieldHandler, RootResolver, RootResolverBuilder};

pub use graphlayer_core::{GraphError, GraphResult, Object, SchemaError, SchemaResult, Value};
