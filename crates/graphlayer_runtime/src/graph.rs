//! Graph definition and the resolution engine.

use crate::dependencies::{Dependencies, Injected};
use crate::expander::{Expander, Expanders, Request};
use graphlayer_core::{GraphError, GraphResult, Value};
use graphlayer_schema::TypeKey;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// A flattened expander registry, built once and shared by every graph created from it.
#[derive(Debug, Clone)]
pub struct GraphDefinition {
    registry: Arc<FxHashMap<TypeKey, Expander>>,
}

impl GraphDefinition {
    /// Flattens `expanders` into a registry keyed by type key.
    ///
    /// Fails if two expanders serve the same key.
    pub fn new(expanders: impl Into<Expanders>) -> GraphResult<Self> {
        let expanders = expanders.into().flatten();
        let mut registry = FxHashMap::default();
        registry.reserve(expanders.len());
        for expander in expanders {
            let key = expander.type_key().clone();
            if registry.contains_key(&key) {
                return Err(GraphError::DuplicateExpander {
                    key: key.to_string(),
                });
            }
            registry.insert(key, expander);
        }

        tracing::debug!(expanders = registry.len(), "graph defined");
        Ok(Self {
            registry: Arc::new(registry),
        })
    }

    /// Creates a graph bound to a dependency map.
    pub fn create_graph<'a>(&self, dependencies: Dependencies<'a>) -> Graph<'a> {
        Graph {
            registry: Arc::clone(&self.registry),
            dependencies,
        }
    }

    pub fn get(&self, key: &TypeKey) -> Option<&Expander> {
        self.registry.get(key)
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.registry.contains_key(key)
    }

    /// Returns the registered keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &TypeKey> {
        self.registry.keys()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

/// Shorthand for [`GraphDefinition::new`].
pub fn define_graph(expanders: impl Into<Expanders>) -> GraphResult<GraphDefinition> {
    GraphDefinition::new(expanders)
}

/// An expander registry paired with the dependencies of one caller.
#[derive(Debug, Clone)]
pub struct Graph<'a> {
    registry: Arc<FxHashMap<TypeKey, Expander>>,
    dependencies: Dependencies<'a>,
}

impl<'a> Graph<'a> {
    /// Resolves a request with the expander registered for its own type key.
    pub fn resolve(&self, request: &dyn Request) -> GraphResult<Value> {
        self.resolve_as(&request.type_key(), request)
    }

    /// Resolves a request with the expander registered for `key`.
    pub fn resolve_as(&self, key: &TypeKey, request: &dyn Request) -> GraphResult<Value> {
        let expander = self
            .registry
            .get(key)
            .ok_or_else(|| GraphError::MissingResolver {
                key: key.to_string(),
            })?;
        let injected = Injected::resolve(expander.dependencies(), &self.dependencies)?;

        tracing::debug!(type_key = %key, dependencies = injected.len(), "expanding");
        expander.expand(self, request, &injected)
    }

    pub fn dependencies(&self) -> &Dependencies<'a> {
        &self.dependencies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependencies::DependencyKey;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Ping;

    impl Request for Ping {
        fn type_key(&self) -> TypeKey {
            TypeKey::custom("ping")
        }
    }

    fn pong() -> Expander {
        Expander::for_request::<Ping, _>(TypeKey::custom("ping"), |_, _, _| Ok(Value::from("pong")))
    }

    #[test]
    fn test_resolve_dispatches_by_type_key() {
        let definition = GraphDefinition::new(pong()).unwrap();
        let graph = definition.create_graph(Dependencies::new());
        assert_eq!(graph.resolve(&Ping).unwrap(), Value::from("pong"));
    }

    #[test]
    fn test_missing_resolver() {
        let definition = GraphDefinition::new(Expanders::empty()).unwrap();
        let graph = definition.create_graph(Dependencies::new());
        let err = graph.resolve(&Ping).unwrap_err();
        assert_eq!(err.to_string(), "resolver missing for type custom:ping");
    }

    #[test]
    fn test_duplicate_keys_are_rejected() {
        let err = GraphDefinition::new(vec![pong(), pong()]).unwrap_err();
        assert_eq!(
            err,
            GraphError::DuplicateExpander {
                key: "custom:ping".to_string()
            }
        );
    }

    #[test]
    fn test_missing_dependency_fails_before_expanding() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let expander = Expander::new(TypeKey::custom("ping"), move |_, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Null)
        })
        .with_dependency("session", DependencyKey::named("session"));

        let definition = GraphDefinition::new(expander).unwrap();
        let graph = definition.create_graph(Dependencies::new());
        let err = graph.resolve(&Ping).unwrap_err();

        assert!(matches!(err, GraphError::MissingDependency { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_definition_is_shared_between_graphs() {
        let definition = GraphDefinition::new(pong()).unwrap();
        let first = definition.create_graph(Dependencies::new());
        let second = definition.create_graph(Dependencies::new());
        assert_eq!(first.resolve(&Ping).unwrap(), second.resolve(&Ping).unwrap());
        assert_eq!(definition.len(), 1);
    }
}
