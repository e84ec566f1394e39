//! Error taxonomy for graphlayer.
//!
//! Schema errors are raised while types, queries and input values are built, before
//! any expander runs. Graph errors are raised during resolution and serialization.

use miette::Diagnostic;
use thiserror::Error;

/// Type alias for results of schema definition and query binding.
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

/// Type alias for results of resolution.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// An error in a schema definition or in binding a query against it.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("type {name} is defined more than once")]
    #[diagnostic(code(graphlayer::duplicate_type))]
    DuplicateType { name: String },

    #[error("{owner} declares field {field} more than once")]
    #[diagnostic(code(graphlayer::duplicate_field))]
    DuplicateField { owner: String, field: String },

    #[error("{field} declares param {param} more than once")]
    #[diagnostic(code(graphlayer::duplicate_param))]
    DuplicateParam { field: String, param: String },

    #[error("{owner} declares value {value} more than once")]
    #[diagnostic(code(graphlayer::duplicate_enum_value))]
    DuplicateEnumValue { owner: String, value: String },

    #[error("unknown type {name} referenced by {referenced_by}")]
    #[diagnostic(code(graphlayer::unknown_type))]
    UnknownType { name: String, referenced_by: String },

    #[error("{implementor} implements {name}, which is not an interface")]
    #[diagnostic(code(graphlayer::not_an_interface))]
    NotAnInterface { name: String, implementor: String },

    #[error("{name} is not an interface")]
    #[diagnostic(code(graphlayer::expected_interface))]
    ExpectedInterface { name: String },

    #[error("{implementor} implements {interface} but has no field {field}")]
    #[diagnostic(code(graphlayer::missing_interface_field))]
    MissingInterfaceField {
        implementor: String,
        interface: String,
        field: String,
    },

    #[error("{name} does not implement {interface}")]
    #[diagnostic(code(graphlayer::not_an_implementation))]
    NotAnImplementation { name: String, interface: String },

    #[error("schema has no type {name}")]
    #[diagnostic(code(graphlayer::no_such_type))]
    NoSuchType { name: String },

    #[error("{name} is not an object or interface type")]
    #[diagnostic(code(graphlayer::not_an_object_type))]
    NotAnObjectType { name: String },

    #[error("{name} is not an input object type")]
    #[diagnostic(code(graphlayer::not_an_input_object))]
    NotAnInputObject { name: String },

    #[error("{name} cannot be used as a field result type")]
    #[diagnostic(code(graphlayer::not_an_output_type))]
    NotAnOutputType { name: String },

    #[error("{owner} has no field {field}")]
    #[diagnostic(code(graphlayer::no_such_field))]
    NoSuchField { owner: String, field: String },

    #[error("{context} has no param {param}")]
    #[diagnostic(code(graphlayer::no_such_param))]
    NoSuchParam { context: String, param: String },

    #[error("missing value for {name}")]
    #[diagnostic(code(graphlayer::missing_value))]
    MissingValue { name: String },

    #[error("query key {key} is selected more than once")]
    #[diagnostic(code(graphlayer::duplicate_key))]
    DuplicateKey { key: String },

    #[error("field {owner}.{field} cannot be selected on {type_name}")]
    #[diagnostic(code(graphlayer::foreign_field))]
    ForeignField {
        owner: String,
        field: String,
        type_name: String,
    },

    #[error("{type_name} has no fields to select")]
    #[diagnostic(code(graphlayer::unexpected_selection))]
    UnexpectedSelection { type_name: String },
}

/// An error raised while resolving or serializing a query.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("resolver missing for type {key}")]
    #[diagnostic(code(graphlayer::missing_resolver))]
    MissingResolver { key: String },

    #[error("resolver missing for field {field}")]
    #[diagnostic(code(graphlayer::missing_field_resolver))]
    MissingFieldResolver { field: String },

    #[error("expander registered more than once for type {key}")]
    #[diagnostic(
        code(graphlayer::duplicate_expander),
        help("each type key (type plus optional tag) may have only one expander")
    )]
    DuplicateExpander { key: String },

    #[error("dependency {key} is not bound in this graph")]
    #[diagnostic(code(graphlayer::missing_dependency))]
    MissingDependency { key: String },

    #[error("dependency {param} is not a {expected}")]
    #[diagnostic(code(graphlayer::dependency_type))]
    DependencyType { param: String, expected: &'static str },

    #[error("no dependency was declared as {param}")]
    #[diagnostic(code(graphlayer::undeclared_dependency))]
    UndeclaredDependency { param: String },

    #[error("expander for {key} expected a {expected} request")]
    #[diagnostic(code(graphlayer::unexpected_request))]
    UnexpectedRequest { key: String, expected: &'static str },

    #[error("expected exactly {expected} but got {found}")]
    #[diagnostic(code(graphlayer::cardinality))]
    Cardinality { expected: &'static str, found: usize },

    #[error("{value} is not a value of enum {type_name}")]
    #[diagnostic(code(graphlayer::invalid_enum_value))]
    InvalidEnumValue { type_name: String, value: String },

    #[error("expected a {expected} value but found {found}")]
    #[diagnostic(code(graphlayer::type_mismatch))]
    TypeMismatch { expected: String, found: &'static str },

    #[error("object has no value for key {key}")]
    #[diagnostic(code(graphlayer::missing_object_key))]
    MissingObjectKey { key: String },

    #[error("no constant value for field {field}")]
    #[diagnostic(code(graphlayer::missing_constant))]
    MissingConstant { field: String },

    #[error("argument {name} is not a valid {expected}")]
    #[diagnostic(code(graphlayer::argument_type))]
    ArgumentType { name: String, expected: &'static str },

    #[error("{0}")]
    #[diagnostic(code(graphlayer::custom))]
    Custom(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),
}

impl GraphError {
    /// Creates a free-form error, typically raised by an expander.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    /// Returns true if the error was raised while binding a query rather than resolving it.
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Self::Schema(_))
    }
}
