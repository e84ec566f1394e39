//! Ready-made expanders for object types.
//!
//! - [`RootResolver`]: dispatches each field of an object query to a handler
//! - [`constant_object_resolver`]: answers every query from a fixed table

use crate::dependencies::{DependencyKey, Injected};
use crate::expander::Expander;
use crate::graph::Graph;
use graphlayer_core::{GraphError, GraphResult, SchemaResult, Value};
use graphlayer_schema::{Args, ObjectQuery, ObjectType, Query, TypeKey};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// A field handler: `(graph, field's result query, bound args, injected dependencies)`.
pub type FieldHandler =
    dyn Fn(&Graph<'_>, &Query, &Args, &Injected<'_>) -> GraphResult<Value> + Send + Sync;

/// Expander that dispatches each field query of an object to a registered handler.
///
/// Typically used for the root type, whose fields are entry points rather
/// than properties of a stored record. Dependencies are declared per field and
/// looked up only when that field is selected.
pub struct RootResolver;

impl RootResolver {
    /// Starts building a root resolver for `object_type`.
    pub fn builder(object_type: &ObjectType) -> RootResolverBuilder {
        RootResolverBuilder {
            object_type: Arc::new(object_type.clone()),
            handlers: Vec::new(),
        }
    }
}

/// A registered field handler with the dependencies it declared.
struct FieldEntry {
    handler: Arc<FieldHandler>,
    dependencies: Vec<(String, DependencyKey)>,
}

/// Builder for a root resolver.
pub struct RootResolverBuilder {
    object_type: Arc<ObjectType>,
    handlers: Vec<(String, FieldEntry)>,
}

impl RootResolverBuilder {
    /// Registers the handler for a field. A later handler for the same field replaces it.
    pub fn field<F>(self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Graph<'_>, &Query, &Args, &Injected<'_>) -> GraphResult<Value> + Send + Sync + 'static,
    {
        self.field_with_dependencies(name, Vec::<(String, DependencyKey)>::new(), handler)
    }

    /// Registers a field handler that needs injected dependencies.
    ///
    /// The dependencies are injected into this handler only.
    pub fn field_with_dependencies<F, I, S>(mut self, name: impl Into<String>, dependencies: I, handler: F) -> Self
    where
        F: Fn(&Graph<'_>, &Query, &Args, &Injected<'_>) -> GraphResult<Value> + Send + Sync + 'static,
        I: IntoIterator<Item = (S, DependencyKey)>,
        S: Into<String>,
    {
        let name = name.into();
        let mut declared: Vec<(String, DependencyKey)> = Vec::new();
        for (param, key) in dependencies {
            let param = param.into();
            declared.retain(|(existing, _)| *existing != param);
            declared.push((param, key));
        }
        self.handlers.retain(|(existing, _)| *existing != name);
        self.handlers.push((
            name,
            FieldEntry {
                handler: Arc::new(handler),
                dependencies: declared,
            },
        ));
        self
    }

    /// Checks every handled field against the type and builds the expander.
    pub fn build(self) -> SchemaResult<Expander> {
        let mut handlers = FxHashMap::default();
        for (name, entry) in self.handlers {
            self.object_type.field(&name)?;
            handlers.insert(name, entry);
        }

        let type_name = self.object_type.name().to_string();
        Ok(Expander::for_query(TypeKey::named(&type_name), move |graph, query, _| {
            let query = object_query(&type_name, query)?;
            resolve_fields(graph, query, &handlers)
        }))
    }
}

fn object_query<'q>(type_name: &str, query: &'q Query) -> GraphResult<&'q ObjectQuery> {
    query.as_object().ok_or_else(|| GraphError::TypeMismatch {
        expected: type_name.to_string(),
        found: "non-object query",
    })
}

fn resolve_fields(
    graph: &Graph<'_>,
    query: &ObjectQuery,
    handlers: &FxHashMap<String, FieldEntry>,
) -> GraphResult<Value> {
    let mut values = Vec::with_capacity(query.len());
    for (key, field_query) in query.fields() {
        let entry = handlers
            .get(field_query.name())
            .ok_or_else(|| GraphError::MissingFieldResolver {
                field: field_query.name().to_string(),
            })?;
        let injected = Injected::resolve(&entry.dependencies, graph.dependencies())?;

        tracing::trace!(
            field = field_query.name(),
            key,
            dependencies = injected.len(),
            "dispatching field"
        );
        let value = (entry.handler)(graph, field_query.type_query(), field_query.args(), &injected)?;
        values.push((key, value));
    }
    Ok(query.create_object(values).into())
}

/// Creates an expander answering every query for `object_type` from `values`,
/// a table of field name to value.
pub fn constant_object_resolver<I, K, V>(object_type: &ObjectType, values: I) -> Expander
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    let type_name = object_type.name().to_string();
    let values: FxHashMap<String, Value> = values
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();

    Expander::for_query(TypeKey::named(&type_name), move |_, query, _| {
        let query = object_query(&type_name, query)?;
        let fields = query
            .fields()
            .map(|(key, field_query)| {
                values
                    .get(field_query.name())
                    .map(|value| (key, value.clone()))
                    .ok_or_else(|| GraphError::MissingConstant {
                        field: field_query.name().to_string(),
                    })
            })
            .collect::<GraphResult<Vec<_>>>()?;
        Ok(query.create_object(fields).into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependencies::Dependencies;
    use crate::graph::GraphDefinition;
    use graphlayer_schema::{key, Field, Schema, TypeRef};

    fn schema() -> Schema {
        Schema::builder()
            .add_object(
                ObjectType::new(
                    "Root",
                    [
                        Field::new("one", TypeRef::int()),
                        Field::new("two", TypeRef::int()),
                    ],
                )
                .unwrap(),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_fields_are_dispatched_to_handlers() {
        let schema = schema();
        let root = schema.object("Root").unwrap();
        let resolver = RootResolver::builder(&root)
            .field("one", |_, _, _, _| Ok(Value::Int(1)))
            .field("two", |_, _, _, _| Ok(Value::Int(2)))
            .build()
            .unwrap();

        let definition = GraphDefinition::new(resolver).unwrap();
        let graph = definition.create_graph(Dependencies::new());
        let query = root
            .query([
                key("b", root.field("two").unwrap().select().unwrap()),
                key("a", root.field("one").unwrap().select().unwrap()),
            ])
            .unwrap();

        let result = graph.resolve(&query).unwrap();
        assert_eq!(result.get("a"), Some(&Value::Int(1)));
        assert_eq!(result.get("b"), Some(&Value::Int(2)));
        assert_eq!(
            result.as_object().unwrap().keys().collect::<Vec<_>>(),
            vec!["b", "a"]
        );
    }

    #[test]
    fn test_unhandled_field_fails() {
        let schema = schema();
        let root = schema.object("Root").unwrap();
        let resolver = RootResolver::builder(&root)
            .field("one", |_, _, _, _| Ok(Value::Int(1)))
            .build()
            .unwrap();

        let definition = GraphDefinition::new(resolver).unwrap();
        let graph = definition.create_graph(Dependencies::new());
        let query = root
            .query([key("two", root.field("two").unwrap().select().unwrap())])
            .unwrap();

        let err = graph.resolve(&query).unwrap_err();
        assert_eq!(err.to_string(), "resolver missing for field two");
    }

    #[test]
    fn test_handler_for_unknown_field_is_rejected() {
        let schema = schema();
        let root = schema.object("Root").unwrap();
        let err = RootResolver::builder(&root)
            .field("three", |_, _, _, _| Ok(Value::Null))
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "Root has no field three");
    }

    fn value_handler(
        _: &Graph<'_>,
        _: &Query,
        _: &Args,
        injected: &Injected<'_>,
    ) -> GraphResult<Value> {
        Ok(Value::Int(*injected.get::<i64>("value")?))
    }

    #[test]
    fn test_fields_resolve_with_dependencies() {
        let schema = schema();
        let root = schema.object("Root").unwrap();
        let resolver = RootResolver::builder(&root)
            .field_with_dependencies("one", [("value", DependencyKey::named("one"))], value_handler)
            .build()
            .unwrap();
        let definition = GraphDefinition::new(resolver).unwrap();
        let one = 1_i64;
        let graph = definition.create_graph(Dependencies::new().with_keyed(DependencyKey::named("one"), &one));

        let query = root
            .query([key("value", root.field("one").unwrap().select().unwrap())])
            .unwrap();
        let result = graph.resolve(&query).unwrap();
        assert_eq!(result.get("value"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_fields_sharing_a_param_name_keep_their_own_dependency() {
        let schema = schema();
        let root = schema.object("Root").unwrap();
        let resolver = RootResolver::builder(&root)
            .field_with_dependencies("one", [("value", DependencyKey::named("x"))], value_handler)
            .field_with_dependencies("two", [("value", DependencyKey::named("y"))], value_handler)
            .build()
            .unwrap();
        let definition = GraphDefinition::new(resolver).unwrap();
        let (x, y) = (1_i64, 2_i64);
        let graph = definition.create_graph(
            Dependencies::new()
                .with_keyed(DependencyKey::named("x"), &x)
                .with_keyed(DependencyKey::named("y"), &y),
        );

        let query = root
            .query([
                key("one", root.field("one").unwrap().select().unwrap()),
                key("two", root.field("two").unwrap().select().unwrap()),
            ])
            .unwrap();
        let result = graph.resolve(&query).unwrap();
        assert_eq!(result.get("one"), Some(&Value::Int(1)));
        assert_eq!(result.get("two"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_unselected_field_dependencies_are_not_required() {
        let schema = schema();
        let root = schema.object("Root").unwrap();
        let resolver = RootResolver::builder(&root)
            .field_with_dependencies("one", [("value", DependencyKey::named("x"))], value_handler)
            .field("two", |_, _, _, _| Ok(Value::Int(2)))
            .build()
            .unwrap();
        let definition = GraphDefinition::new(resolver).unwrap();
        let graph = definition.create_graph(Dependencies::new());

        let query = root
            .query([key("two", root.field("two").unwrap().select().unwrap())])
            .unwrap();
        assert_eq!(graph.resolve(&query).unwrap().get("two"), Some(&Value::Int(2)));

        let query = root
            .query([key("one", root.field("one").unwrap().select().unwrap())])
            .unwrap();
        let err = graph.resolve(&query).unwrap_err();
        assert_eq!(err.to_string(), "dependency x is not bound in this graph");
    }

    #[test]
    fn test_constant_object_resolver() {
        let schema = schema();
        let root = schema.object("Root").unwrap();
        let resolver = constant_object_resolver(&root, [("one", 1), ("two", 2)]);

        let definition = GraphDefinition::new(resolver).unwrap();
        let graph = definition.create_graph(Dependencies::new());
        let query = root
            .query([key("value", root.field("two").unwrap().select().unwrap())])
            .unwrap();

        let result = graph.resolve(&query).unwrap();
        assert_eq!(result.get("value"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_constant_object_resolver_missing_value() {
        let schema = schema();
        let root = schema.object("Root").unwrap();
        let resolver = constant_object_resolver(&root, [("one", 1)]);

        let definition = GraphDefinition::new(resolver).unwrap();
        let graph = definition.create_graph(Dependencies::new());
        let query = root
            .query([key("two", root.field("two").unwrap().select().unwrap())])
            .unwrap();

        let err = graph.resolve(&query).unwrap_err();
        assert_eq!(err.to_string(), "no constant value for field two");
    }
}
