//! Schema definition for graphlayer.
//!
//! Object, interface, input object and enum types are validated when they are
//! constructed; cross-type references are validated by [`SchemaBuilder::build`].

use crate::query::FieldQueryBuilder;
use graphlayer_core::{Object, SchemaError, SchemaResult, Value};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

pub const BOOLEAN: &str = "Boolean";
pub const INT: &str = "Int";
pub const FLOAT: &str = "Float";
pub const STRING: &str = "String";
pub const ID: &str = "ID";

/// Type reference used by fields, params and input fields.
///
/// Named types are non-null; `Nullable` admits null.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    Nullable(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn list(inner: TypeRef) -> Self {
        Self::List(Box::new(inner))
    }

    pub fn nullable(inner: TypeRef) -> Self {
        Self::Nullable(Box::new(inner))
    }

    pub fn boolean() -> Self {
        Self::named(BOOLEAN)
    }

    pub fn int() -> Self {
        Self::named(INT)
    }

    pub fn float() -> Self {
        Self::named(FLOAT)
    }

    pub fn string() -> Self {
        Self::named(STRING)
    }

    pub fn id() -> Self {
        Self::named(ID)
    }

    /// Returns the name under all list and nullable wrappers.
    pub fn innermost_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::Nullable(inner) => inner.innermost_name(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::List(inner) => write!(f, "List<{inner}>"),
            Self::Nullable(inner) => write!(f, "Option<{inner}>"),
        }
    }
}

/// The built-in scalar kinds. `Custom` scalars pass values through structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScalarKind {
    Boolean,
    Int,
    Float,
    String,
    Id,
    Custom,
}

/// Scalar type definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ScalarType {
    pub name: String,
    pub kind: ScalarKind,
}

impl ScalarType {
    /// Creates a custom scalar.
    pub fn custom(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ScalarKind::Custom,
        }
    }

    fn builtin(name: &str, kind: ScalarKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }

    /// The built-in scalars, in registration order.
    pub fn builtins() -> [ScalarType; 5] {
        [
            Self::builtin(BOOLEAN, ScalarKind::Boolean),
            Self::builtin(INT, ScalarKind::Int),
            Self::builtin(FLOAT, ScalarKind::Float),
            Self::builtin(STRING, ScalarKind::String),
            Self::builtin(ID, ScalarKind::Id),
        ]
    }
}

/// An input value (param or input field).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputValue {
    pub name: String,
    pub ty: TypeRef,
    /// `Some(Value::Null)` is an explicit null default; `None` means the value is required.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// A declared field parameter.
pub type Param = InputValue;

/// A declared input object field.
pub type InputField = InputValue;

impl InputValue {
    /// Creates a required input value.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    /// Sets the default used when no value is supplied.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Field definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub ty: TypeRef,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty,
            params: Vec::new(),
        }
    }

    /// Adds a declared param.
    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Adds several declared params.
    pub fn with_params(mut self, params: impl IntoIterator<Item = Param>) -> Self {
        self.params.extend(params);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Looks up a declared param.
    pub fn param(&self, name: &str) -> SchemaResult<&Param> {
        self.params
            .iter()
            .find(|param| param.name == name)
            .ok_or_else(|| SchemaError::NoSuchParam {
                context: self.name.clone(),
                param: name.to_string(),
            })
    }

    fn validate(&self) -> SchemaResult<()> {
        for (index, param) in self.params.iter().enumerate() {
            if self.params[..index].iter().any(|p| p.name == param.name) {
                return Err(SchemaError::DuplicateParam {
                    field: self.name.clone(),
                    param: param.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Whether an [`ObjectType`] is a concrete object type or an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ObjectKind {
    Object,
    Interface,
}

/// Object or interface type definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectType {
    name: String,
    kind: ObjectKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    fields: IndexMap<String, Arc<Field>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    interfaces: Vec<String>,
}

impl ObjectType {
    /// Creates an object type, rejecting duplicate field and param names.
    pub fn new(name: impl Into<String>, fields: impl IntoIterator<Item = Field>) -> SchemaResult<Self> {
        Self::with_kind(name.into(), ObjectKind::Object, fields)
    }

    /// Creates an interface type, rejecting duplicate field and param names.
    pub fn interface(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = Field>,
    ) -> SchemaResult<Self> {
        Self::with_kind(name.into(), ObjectKind::Interface, fields)
    }

    fn with_kind(
        name: String,
        kind: ObjectKind,
        fields: impl IntoIterator<Item = Field>,
    ) -> SchemaResult<Self> {
        let mut by_name = IndexMap::new();
        for field in fields {
            field.validate()?;
            if by_name.contains_key(&field.name) {
                return Err(SchemaError::DuplicateField {
                    owner: name,
                    field: field.name,
                });
            }
            by_name.insert(field.name.clone(), Arc::new(field));
        }
        Ok(Self {
            name,
            kind,
            description: None,
            fields: by_name,
            interfaces: Vec::new(),
        })
    }

    /// Declares the interfaces this type implements.
    pub fn implements<I, S>(mut self, interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interfaces.extend(interfaces.into_iter().map(Into::into));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ObjectKind::Interface
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    pub fn fields(&self) -> impl Iterator<Item = &Arc<Field>> {
        self.fields.values()
    }

    /// Looks up a field, failing with "`<Type>` has no field `<name>`".
    pub fn field(&self, name: &str) -> SchemaResult<&Arc<Field>> {
        self.fields.get(name).ok_or_else(|| SchemaError::NoSuchField {
            owner: self.name.clone(),
            field: name.to_string(),
        })
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
}

/// Enum type definition: a fixed mapping from domain values to external names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumType {
    name: String,
    values: IndexMap<String, String>,
}

impl EnumType {
    /// Creates an enum from `(domain value, external name)` pairs.
    pub fn new<I, D, E>(name: impl Into<String>, values: I) -> SchemaResult<Self>
    where
        I: IntoIterator<Item = (D, E)>,
        D: Into<String>,
        E: Into<String>,
    {
        let name = name.into();
        let mut by_domain: IndexMap<String, String> = IndexMap::new();
        for (domain, external) in values {
            let (domain, external) = (domain.into(), external.into());
            if by_domain.contains_key(&domain) {
                return Err(SchemaError::DuplicateEnumValue {
                    owner: name,
                    value: domain,
                });
            }
            if by_domain.values().any(|existing| *existing == external) {
                return Err(SchemaError::DuplicateEnumValue {
                    owner: name,
                    value: external,
                });
            }
            by_domain.insert(domain, external);
        }
        Ok(Self {
            name,
            values: by_domain,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the external name of a domain value.
    pub fn external_name(&self, domain: &str) -> Option<&str> {
        self.values.get(domain).map(String::as_str)
    }

    /// Returns the domain value for an external name.
    pub fn domain_value(&self, external: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(_, name)| name.as_str() == external)
            .map(|(domain, _)| domain.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(d, e)| (d.as_str(), e.as_str()))
    }
}

/// Input object type definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputObjectType {
    name: String,
    fields: IndexMap<String, InputField>,
}

impl InputObjectType {
    /// Creates an input object type, rejecting duplicate field names.
    pub fn new(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = InputField>,
    ) -> SchemaResult<Self> {
        let name = name.into();
        let mut by_name = IndexMap::new();
        for field in fields {
            if by_name.contains_key(&field.name) {
                return Err(SchemaError::DuplicateField {
                    owner: name,
                    field: field.name,
                });
            }
            by_name.insert(field.name.clone(), field);
        }
        Ok(Self {
            name,
            fields: by_name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> impl Iterator<Item = &InputField> {
        self.fields.values()
    }

    pub fn field(&self, name: &str) -> SchemaResult<&InputField> {
        self.fields.get(name).ok_or_else(|| SchemaError::NoSuchField {
            owner: self.name.clone(),
            field: name.to_string(),
        })
    }

    /// Builds a validated input value: supplied values first, then defaults.
    pub fn instantiate<I, K, V>(&self, values: I) -> SchemaResult<InputObject>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let supplied = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let values = bind_values(self.fields.values(), supplied, |name| {
            SchemaError::NoSuchField {
                owner: self.name.clone(),
                field: name.to_string(),
            }
        })?;
        Ok(InputObject {
            type_name: self.name.clone(),
            values,
        })
    }
}

/// A bound input object value.
#[derive(Debug, Clone, PartialEq)]
pub struct InputObject {
    type_name: String,
    values: IndexMap<String, Value>,
}

impl InputObject {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, name: &str) -> SchemaResult<&Value> {
        self.values.get(name).ok_or_else(|| SchemaError::NoSuchField {
            owner: self.type_name.clone(),
            field: name.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<InputObject> for Value {
    fn from(input: InputObject) -> Self {
        Value::Object(Object::typed(input.type_name, input.values))
    }
}

/// Binds supplied values against declarations.
///
/// Unknown names fail first; then each declaration takes its supplied value,
/// else its default, else fails with "missing value for `<name>`".
pub(crate) fn bind_values<'a>(
    declared: impl Iterator<Item = &'a InputValue> + Clone,
    mut supplied: IndexMap<String, Value>,
    unknown: impl Fn(&str) -> SchemaError,
) -> SchemaResult<IndexMap<String, Value>> {
    if let Some(name) = supplied
        .keys()
        .find(|name| !declared.clone().any(|decl| decl.name == **name))
    {
        return Err(unknown(name));
    }

    declared
        .map(|decl| -> SchemaResult<(String, Value)> {
            let value = match supplied.shift_remove(&decl.name) {
                Some(value) => value,
                None => decl.default.clone().ok_or_else(|| SchemaError::MissingValue {
                    name: decl.name.clone(),
                })?,
            };
            Ok((decl.name.clone(), value))
        })
        .collect()
}

/// A type definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "definition")]
pub enum TypeDef {
    Scalar(ScalarType),
    Enum(Arc<EnumType>),
    Object(Arc<ObjectType>),
    Interface(Arc<ObjectType>),
    InputObject(Arc<InputObjectType>),
}

impl TypeDef {
    pub fn name(&self) -> &str {
        match self {
            Self::Scalar(s) => &s.name,
            Self::Enum(e) => e.name(),
            Self::Object(o) | Self::Interface(o) => o.name(),
            Self::InputObject(i) => i.name(),
        }
    }

    fn is_output(&self) -> bool {
        !matches!(self, Self::InputObject(_))
    }

    fn is_input(&self) -> bool {
        matches!(
            self,
            Self::Scalar(_) | Self::Enum(_) | Self::InputObject(_)
        )
    }
}

/// A validated schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    types: IndexMap<String, TypeDef>,
}

impl Schema {
    /// Creates a schema builder with the built-in scalars registered.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Gets a type by name.
    pub fn get_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Returns all types.
    pub fn types(&self) -> impl Iterator<Item = (&String, &TypeDef)> {
        self.types.iter()
    }

    /// Looks up an object or interface type.
    pub fn object(&self, name: &str) -> SchemaResult<ObjectRef<'_>> {
        match self.get_type(name) {
            Some(TypeDef::Object(ty) | TypeDef::Interface(ty)) => Ok(ObjectRef { schema: self, ty }),
            Some(_) => Err(SchemaError::NotAnObjectType {
                name: name.to_string(),
            }),
            None => Err(SchemaError::NoSuchType {
                name: name.to_string(),
            }),
        }
    }

    /// Looks up an input object type.
    pub fn input_object(&self, name: &str) -> SchemaResult<&InputObjectType> {
        match self.get_type(name) {
            Some(TypeDef::InputObject(ty)) => Ok(ty),
            Some(_) => Err(SchemaError::NotAnInputObject {
                name: name.to_string(),
            }),
            None => Err(SchemaError::NoSuchType {
                name: name.to_string(),
            }),
        }
    }

    /// Returns true if `type_name` is `interface` or declares that it implements it.
    pub fn implements(&self, type_name: &str, interface: &str) -> bool {
        type_name == interface
            || matches!(
                self.get_type(type_name),
                Some(TypeDef::Object(ty)) if ty.interfaces().iter().any(|i| i == interface)
            )
    }

    /// Returns the object types implementing an interface, in definition order.
    pub fn implementations<'s>(
        &'s self,
        interface: &'s str,
    ) -> impl Iterator<Item = &'s Arc<ObjectType>> + 's {
        self.types.values().filter_map(move |def| match def {
            TypeDef::Object(ty) if ty.interfaces().iter().any(|i| i == interface) => Some(ty),
            _ => None,
        })
    }
}

/// A borrowed object or interface type together with its schema.
#[derive(Debug, Clone, Copy)]
pub struct ObjectRef<'s> {
    pub(crate) schema: &'s Schema,
    pub(crate) ty: &'s Arc<ObjectType>,
}

impl<'s> ObjectRef<'s> {
    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    pub fn object_type(&self) -> &'s Arc<ObjectType> {
        self.ty
    }

    /// Looks up a field of this type.
    pub fn field(&self, name: &str) -> SchemaResult<FieldRef<'s>> {
        Ok(FieldRef {
            schema: self.schema,
            owner: self.ty,
            field: self.ty.field(name)?,
        })
    }
}

impl std::ops::Deref for ObjectRef<'_> {
    type Target = ObjectType;

    fn deref(&self) -> &Self::Target {
        self.ty
    }
}

/// A borrowed field together with its owning type and schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldRef<'s> {
    pub(crate) schema: &'s Schema,
    pub(crate) owner: &'s Arc<ObjectType>,
    pub(crate) field: &'s Arc<Field>,
}

impl<'s> FieldRef<'s> {
    pub fn name(&self) -> &'s str {
        &self.field.name
    }

    pub fn field(&self) -> &'s Arc<Field> {
        self.field
    }

    pub fn owner(&self) -> &'s ObjectType {
        self.owner
    }

    /// Looks up a declared param, failing with "`<field>` has no param `<name>`".
    pub fn param(&self, name: &str) -> SchemaResult<&'s Param> {
        self.field.param(name)
    }

    /// Starts binding a field query.
    pub fn query(&self) -> FieldQueryBuilder<'s> {
        FieldQueryBuilder::new(*self)
    }

    /// Binds a field query with no explicit arguments or nested selections.
    pub fn select(&self) -> SchemaResult<crate::query::FieldQuery> {
        self.query().build()
    }
}

/// Schema builder.
#[derive(Debug)]
pub struct SchemaBuilder {
    pending: Vec<TypeDef>,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaBuilder {
    /// Creates a new schema builder with the built-in scalars.
    pub fn new() -> Self {
        Self {
            pending: ScalarType::builtins()
                .into_iter()
                .map(TypeDef::Scalar)
                .collect(),
        }
    }

    /// Adds an object or interface type.
    pub fn add_object(mut self, ty: ObjectType) -> Self {
        let def = if ty.is_interface() {
            TypeDef::Interface(Arc::new(ty))
        } else {
            TypeDef::Object(Arc::new(ty))
        };
        self.pending.push(def);
        self
    }

    /// Adds an interface type, rejecting concrete object types.
    pub fn add_interface(mut self, ty: ObjectType) -> SchemaResult<Self> {
        if !ty.is_interface() {
            return Err(SchemaError::ExpectedInterface {
                name: ty.name().to_string(),
            });
        }
        self.pending.push(TypeDef::Interface(Arc::new(ty)));
        Ok(self)
    }

    /// Adds an enum type.
    pub fn add_enum(mut self, ty: EnumType) -> Self {
        self.pending.push(TypeDef::Enum(Arc::new(ty)));
        self
    }

    /// Adds an input object type.
    pub fn add_input_object(mut self, ty: InputObjectType) -> Self {
        self.pending.push(TypeDef::InputObject(Arc::new(ty)));
        self
    }

    /// Adds a custom scalar.
    pub fn add_scalar(mut self, name: impl Into<String>) -> Self {
        self.pending.push(TypeDef::Scalar(ScalarType::custom(name)));
        self
    }

    /// Validates all cross-type references and builds the schema.
    pub fn build(self) -> SchemaResult<Schema> {
        let mut types = IndexMap::with_capacity(self.pending.len());
        for def in self.pending {
            let name = def.name().to_string();
            if types.contains_key(&name) {
                return Err(SchemaError::DuplicateType { name });
            }
            types.insert(name, def);
        }

        let schema = Schema { types };
        for def in schema.types.values() {
            match def {
                TypeDef::Object(ty) | TypeDef::Interface(ty) => schema.validate_object(ty)?,
                TypeDef::InputObject(ty) => {
                    for field in ty.fields() {
                        schema.validate_input_ref(&field.ty, &format!("{}.{}", ty.name(), field.name))?;
                    }
                }
                TypeDef::Scalar(_) | TypeDef::Enum(_) => {}
            }
        }

        tracing::debug!(types = schema.types.len(), "schema built");
        Ok(schema)
    }
}

impl Schema {
    fn validate_object(&self, ty: &ObjectType) -> SchemaResult<()> {
        for field in ty.fields() {
            let location = format!("{}.{}", ty.name(), field.name);
            let name = field.ty.innermost_name();
            match self.get_type(name) {
                Some(def) if def.is_output() => {}
                Some(_) => {
                    return Err(SchemaError::NotAnOutputType {
                        name: name.to_string(),
                    })
                }
                None => {
                    return Err(SchemaError::UnknownType {
                        name: name.to_string(),
                        referenced_by: location,
                    })
                }
            }
            for param in &field.params {
                self.validate_input_ref(&param.ty, &format!("{location}({})", param.name))?;
            }
        }

        for interface in ty.interfaces() {
            let iface = match self.get_type(interface) {
                Some(TypeDef::Interface(iface)) => iface,
                Some(_) => {
                    return Err(SchemaError::NotAnInterface {
                        name: interface.clone(),
                        implementor: ty.name().to_string(),
                    })
                }
                None => {
                    return Err(SchemaError::UnknownType {
                        name: interface.clone(),
                        referenced_by: ty.name().to_string(),
                    })
                }
            };
            if let Some(missing) = iface.fields().find(|f| !ty.has_field(&f.name)) {
                return Err(SchemaError::MissingInterfaceField {
                    implementor: ty.name().to_string(),
                    interface: interface.clone(),
                    field: missing.name.clone(),
                });
            }
        }
        Ok(())
    }

    fn validate_input_ref(&self, ty: &TypeRef, location: &str) -> SchemaResult<()> {
        let name = ty.innermost_name();
        match self.get_type(name) {
            Some(def) if def.is_input() => Ok(()),
            _ => Err(SchemaError::UnknownType {
                name: name.to_string(),
                referenced_by: location.to_string(),
            }),
        }
    }
}
