//! Immutable queries built against a [`Schema`].
//!
//! A query mirrors the shape of the result it asks for: object queries hold an
//! ordered set of keyed field queries, list and nullable queries wrap an element
//! query. Binding errors are raised while a query is built.

use crate::schema::{
    bind_values, EnumType, Field, FieldRef, ObjectRef, ObjectType, ScalarType, Schema, TypeDef,
    TypeRef,
};
use graphlayer_core::{FromValue, GraphError, GraphResult, Object, SchemaError, SchemaResult, Value};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// The shape part of a [`TypeKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeShape {
    Named(Arc<str>),
    List(Box<TypeShape>),
    Nullable(Box<TypeShape>),
    /// A caller-defined request kind, not part of the schema.
    Custom(Arc<str>),
}

impl From<&TypeRef> for TypeShape {
    fn from(ty: &TypeRef) -> Self {
        match ty {
            TypeRef::Named(name) => Self::Named(name.as_str().into()),
            TypeRef::List(inner) => Self::List(Box::new(inner.as_ref().into())),
            TypeRef::Nullable(inner) => Self::Nullable(Box::new(inner.as_ref().into())),
        }
    }
}

impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::List(inner) => write!(f, "List<{inner}>"),
            Self::Nullable(inner) => write!(f, "Option<{inner}>"),
            Self::Custom(name) => write!(f, "custom:{name}"),
        }
    }
}

/// The key used to select an expander: a type shape plus an optional tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeKey {
    shape: TypeShape,
    tag: Option<Arc<str>>,
}

impl TypeKey {
    pub fn new(shape: TypeShape) -> Self {
        Self { shape, tag: None }
    }

    /// Key for a named schema type.
    pub fn named(name: &str) -> Self {
        Self::new(TypeShape::Named(name.into()))
    }

    /// Key for a type reference, e.g. `List<Book>`.
    pub fn of(ty: &TypeRef) -> Self {
        Self::new(ty.into())
    }

    /// Key for a caller-defined request kind.
    pub fn custom(name: &str) -> Self {
        Self::new(TypeShape::Custom(name.into()))
    }

    /// Returns this key with a disambiguating tag.
    pub fn tagged(mut self, tag: &str) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn shape(&self) -> &TypeShape {
        &self.shape
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.shape)?;
        if let Some(tag) = &self.tag {
            write!(f, "@{tag}")?;
        }
        Ok(())
    }
}

/// A query node.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    kind: QueryKind,
    tag: Option<Arc<str>>,
}

/// The type-specific part of a [`Query`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryKind {
    Scalar(ScalarType),
    Enum(Arc<EnumType>),
    Object(ObjectQuery),
    List(Box<Query>),
    Nullable(Box<Query>),
}

impl Query {
    fn from_kind(kind: QueryKind) -> Self {
        Self { kind, tag: None }
    }

    pub fn scalar(ty: ScalarType) -> Self {
        Self::from_kind(QueryKind::Scalar(ty))
    }

    pub fn enumeration(ty: Arc<EnumType>) -> Self {
        Self::from_kind(QueryKind::Enum(ty))
    }

    pub fn object(query: ObjectQuery) -> Self {
        Self::from_kind(QueryKind::Object(query))
    }

    /// Wraps an element query in a list query.
    pub fn list(element: Query) -> Self {
        Self::from_kind(QueryKind::List(Box::new(element)))
    }

    /// Wraps an element query in a nullable query.
    pub fn nullable(element: Query) -> Self {
        Self::from_kind(QueryKind::Nullable(Box::new(element)))
    }

    /// Returns this query tagged for expander dispatch.
    pub fn tagged(mut self, tag: &str) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn kind(&self) -> &QueryKind {
        &self.kind
    }

    pub fn shape(&self) -> TypeShape {
        match &self.kind {
            QueryKind::Scalar(s) => TypeShape::Named(s.name.as_str().into()),
            QueryKind::Enum(e) => TypeShape::Named(e.name().into()),
            QueryKind::Object(o) => TypeShape::Named(o.type_name().into()),
            QueryKind::List(element) => TypeShape::List(Box::new(element.shape())),
            QueryKind::Nullable(element) => TypeShape::Nullable(Box::new(element.shape())),
        }
    }

    /// The key used to dispatch this query to an expander.
    pub fn type_key(&self) -> TypeKey {
        TypeKey {
            shape: self.shape(),
            tag: self.tag.clone(),
        }
    }

    pub fn as_object(&self) -> Option<&ObjectQuery> {
        match &self.kind {
            QueryKind::Object(query) => Some(query),
            _ => None,
        }
    }

    /// The element query of a list or nullable query.
    pub fn element_query(&self) -> Option<&Query> {
        match &self.kind {
            QueryKind::List(element) | QueryKind::Nullable(element) => Some(element),
            _ => None,
        }
    }

    /// The object query under any list and nullable wrappers.
    pub fn innermost_object(&self) -> Option<&ObjectQuery> {
        match &self.kind {
            QueryKind::Object(query) => Some(query),
            QueryKind::List(element) | QueryKind::Nullable(element) => element.innermost_object(),
            QueryKind::Scalar(_) | QueryKind::Enum(_) => None,
        }
    }

    /// Rebuilds the same wrappers around a new innermost object query.
    pub fn map_innermost_object<F>(&self, f: F) -> SchemaResult<Query>
    where
        F: FnOnce(&ObjectQuery) -> SchemaResult<ObjectQuery>,
    {
        let kind = match &self.kind {
            QueryKind::Object(query) => QueryKind::Object(f(query)?),
            QueryKind::List(element) => QueryKind::List(Box::new(element.map_innermost_object(f)?)),
            QueryKind::Nullable(element) => {
                QueryKind::Nullable(Box::new(element.map_innermost_object(f)?))
            }
            QueryKind::Scalar(s) => {
                return Err(SchemaError::UnexpectedSelection {
                    type_name: s.name.clone(),
                })
            }
            QueryKind::Enum(e) => {
                return Err(SchemaError::UnexpectedSelection {
                    type_name: e.name().to_string(),
                })
            }
        };
        Ok(Query {
            kind,
            tag: self.tag.clone(),
        })
    }
}

/// A query for an object or interface type: ordered, keyed field queries.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectQuery {
    object_type: Arc<ObjectType>,
    fields: IndexMap<String, FieldQuery>,
}

impl ObjectQuery {
    pub fn object_type(&self) -> &Arc<ObjectType> {
        &self.object_type
    }

    pub fn type_name(&self) -> &str {
        self.object_type.name()
    }

    /// Iterates `(key, field query)` pairs in selection order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldQuery)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates field queries in selection order.
    pub fn field_queries(&self) -> impl Iterator<Item = &FieldQuery> {
        self.fields.values()
    }

    pub fn get(&self, key: &str) -> Option<&FieldQuery> {
        self.fields.get(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Creates a result object produced by this query's type.
    pub fn create_object<I, K, V>(&self, values: I) -> Object
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Object::typed(self.type_name(), values)
    }

    /// Narrows an interface query to one implementation.
    ///
    /// Keeps the interface's own fields, rebound to the implementation, and the
    /// fields owned by the implementation; drops fields of other implementations.
    pub fn narrow(&self, schema: &Schema, implementation: &str) -> SchemaResult<ObjectQuery> {
        let target = schema.object(implementation)?;
        if !schema.implements(implementation, self.type_name()) {
            return Err(SchemaError::NotAnImplementation {
                name: implementation.to_string(),
                interface: self.type_name().to_string(),
            });
        }

        let mut fields = IndexMap::new();
        for (key, field_query) in &self.fields {
            let owner = field_query.owner();
            if owner == self.type_name() || owner == implementation {
                let field = target.object_type().field(field_query.name())?;
                fields.insert(
                    key.clone(),
                    FieldQuery {
                        owner: implementation.into(),
                        field: Arc::clone(field),
                        args: field_query.args.clone(),
                        type_query: field_query.type_query.clone(),
                    },
                );
            }
        }

        Ok(ObjectQuery {
            object_type: Arc::clone(target.object_type()),
            fields,
        })
    }
}

/// A bound invocation of one field: arguments plus the query for its result type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldQuery {
    owner: Arc<str>,
    field: Arc<Field>,
    args: Args,
    type_query: Query,
}

impl FieldQuery {
    /// The name of the type that declares the field.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn field(&self) -> &Arc<Field> {
        &self.field
    }

    pub fn name(&self) -> &str {
        &self.field.name
    }

    pub fn args(&self) -> &Args {
        &self.args
    }

    /// The query for the field's result type.
    pub fn type_query(&self) -> &Query {
        &self.type_query
    }
}

/// Bound arguments of a field query, in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Args {
    context: String,
    values: IndexMap<String, Value>,
}

impl Args {
    /// Gets an argument, failing with "`<field>` has no param `<name>`".
    pub fn get(&self, name: &str) -> SchemaResult<&Value> {
        self.values.get(name).ok_or_else(|| SchemaError::NoSuchParam {
            context: self.context.clone(),
            param: name.to_string(),
        })
    }

    /// Gets an argument as a specific type.
    pub fn get_as<T: FromValue>(&self, name: &str) -> GraphResult<T> {
        let value = self.get(name)?;
        T::from_value(value).ok_or_else(|| GraphError::ArgumentType {
            name: name.to_string(),
            expected: std::any::type_name::<T>(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Pairs an output key with a field query.
pub fn key(key: impl Into<String>, field_query: FieldQuery) -> (String, FieldQuery) {
    (key.into(), field_query)
}

/// Builder for a [`FieldQuery`].
#[derive(Debug)]
pub struct FieldQueryBuilder<'s> {
    field: FieldRef<'s>,
    args: IndexMap<String, Value>,
    selections: Vec<(String, FieldQuery)>,
}

impl<'s> FieldQueryBuilder<'s> {
    pub(crate) fn new(field: FieldRef<'s>) -> Self {
        Self {
            field,
            args: IndexMap::new(),
            selections: Vec::new(),
        }
    }

    /// Supplies an argument value.
    pub fn arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    /// Adds a nested selection on the field's result type.
    pub fn select(mut self, key: impl Into<String>, field_query: FieldQuery) -> Self {
        self.selections.push((key.into(), field_query));
        self
    }

    /// Adds several nested selections.
    pub fn selections(mut self, selections: impl IntoIterator<Item = (String, FieldQuery)>) -> Self {
        self.selections.extend(selections);
        self
    }

    /// Binds arguments and builds the nested type query.
    pub fn build(self) -> SchemaResult<FieldQuery> {
        let field = self.field.field;
        let values = bind_values(field.params.iter(), self.args, |param| {
            SchemaError::NoSuchParam {
                context: field.name.clone(),
                param: param.to_string(),
            }
        })?;
        let type_query = self.field.schema.type_query(&field.ty, self.selections)?;

        Ok(FieldQuery {
            owner: self.field.owner.name().into(),
            field: Arc::clone(field),
            args: Args {
                context: field.name.clone(),
                values,
            },
            type_query,
        })
    }
}

impl Schema {
    /// Builds the query for a type reference with the given nested selections.
    pub fn type_query(
        &self,
        ty: &TypeRef,
        selections: Vec<(String, FieldQuery)>,
    ) -> SchemaResult<Query> {
        match ty {
            TypeRef::List(inner) => Ok(Query::list(self.type_query(inner, selections)?)),
            TypeRef::Nullable(inner) => Ok(Query::nullable(self.type_query(inner, selections)?)),
            TypeRef::Named(name) => match self.get_type(name) {
                Some(TypeDef::Object(ty) | TypeDef::Interface(ty)) => {
                    Ok(Query::object(self.object_query(ty, selections)?))
                }
                Some(TypeDef::Scalar(_) | TypeDef::Enum(_)) if !selections.is_empty() => {
                    Err(SchemaError::UnexpectedSelection {
                        type_name: name.clone(),
                    })
                }
                Some(TypeDef::Scalar(scalar)) => Ok(Query::scalar(scalar.clone())),
                Some(TypeDef::Enum(enum_type)) => Ok(Query::enumeration(Arc::clone(enum_type))),
                Some(TypeDef::InputObject(_)) => Err(SchemaError::NotAnOutputType {
                    name: name.clone(),
                }),
                None => Err(SchemaError::NoSuchType { name: name.clone() }),
            },
        }
    }

    /// Builds an object query, checking key uniqueness and field ownership.
    pub fn object_query(
        &self,
        ty: &Arc<ObjectType>,
        selections: Vec<(String, FieldQuery)>,
    ) -> SchemaResult<ObjectQuery> {
        let mut fields = IndexMap::with_capacity(selections.len());
        for (key, field_query) in selections {
            let owned = field_query.owner() == ty.name()
                || (ty.is_interface() && self.implements(field_query.owner(), ty.name()));
            if !owned {
                return Err(SchemaError::ForeignField {
                    owner: field_query.owner().to_string(),
                    field: field_query.name().to_string(),
                    type_name: ty.name().to_string(),
                });
            }
            if fields.contains_key(&key) {
                return Err(SchemaError::DuplicateKey { key });
            }
            fields.insert(key, field_query);
        }
        Ok(ObjectQuery {
            object_type: Arc::clone(ty),
            fields,
        })
    }
}

impl<'s> ObjectRef<'s> {
    /// Builds a query on this type from keyed selections.
    pub fn query(
        &self,
        selections: impl IntoIterator<Item = (String, FieldQuery)>,
    ) -> SchemaResult<Query> {
        let query = self
            .schema
            .object_query(self.ty, selections.into_iter().collect())?;
        Ok(Query::object(query))
    }
}
