//! Expanders and the requests they serve.
//!
//! An expander is a resolver bound to a [`TypeKey`]. Expanders are registered
//! in nested [`Expanders`] groups which are flattened when a graph is defined.

use crate::dependencies::{DependencyKey, Injected};
use crate::graph::Graph;
use graphlayer_core::{GraphError, GraphResult, Value};
use graphlayer_schema::{Query, TypeKey};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Upcast to [`Any`] for downcasting trait objects.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Something a graph can resolve: a [`Query`] or a caller-defined request.
pub trait Request: AsAny + fmt::Debug + Send + Sync {
    /// The key used to select the expander.
    fn type_key(&self) -> TypeKey;
}

impl Request for Query {
    fn type_key(&self) -> TypeKey {
        Query::type_key(self)
    }
}

/// The erased expander function.
pub type ExpandFn =
    dyn Fn(&Graph<'_>, &dyn Request, &Injected<'_>) -> GraphResult<Value> + Send + Sync;

/// A resolver bound to a type key.
#[derive(Clone)]
pub struct Expander {
    type_key: TypeKey,
    dependencies: Vec<(String, DependencyKey)>,
    expand: Arc<ExpandFn>,
}

impl Expander {
    /// Creates an expander taking any request.
    pub fn new<F>(type_key: TypeKey, expand: F) -> Self
    where
        F: Fn(&Graph<'_>, &dyn Request, &Injected<'_>) -> GraphResult<Value> + Send + Sync + 'static,
    {
        Self {
            type_key,
            dependencies: Vec::new(),
            expand: Arc::new(expand),
        }
    }

    /// Creates an expander for schema queries.
    pub fn for_query<F>(type_key: TypeKey, expand: F) -> Self
    where
        F: Fn(&Graph<'_>, &Query, &Injected<'_>) -> GraphResult<Value> + Send + Sync + 'static,
    {
        Self::for_request::<Query, F>(type_key, expand)
    }

    /// Creates an expander for a caller-defined request type.
    ///
    /// Requests of any other type fail with [`GraphError::UnexpectedRequest`].
    pub fn for_request<R, F>(type_key: TypeKey, expand: F) -> Self
    where
        R: Request + 'static,
        F: Fn(&Graph<'_>, &R, &Injected<'_>) -> GraphResult<Value> + Send + Sync + 'static,
    {
        let key = type_key.to_string();
        Self::new(type_key, move |graph, request, injected| {
            let request = request.as_any().downcast_ref::<R>().ok_or_else(|| {
                GraphError::UnexpectedRequest {
                    key: key.clone(),
                    expected: std::any::type_name::<R>(),
                }
            })?;
            expand(graph, request, injected)
        })
    }

    /// Declares a dependency injected under the local name `param`.
    pub fn with_dependency(mut self, param: impl Into<String>, key: DependencyKey) -> Self {
        let param = param.into();
        self.dependencies.retain(|(existing, _)| *existing != param);
        self.dependencies.push((param, key));
        self
    }

    /// Declares several dependencies.
    pub fn with_dependencies<I, S>(self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = (S, DependencyKey)>,
        S: Into<String>,
    {
        dependencies
            .into_iter()
            .fold(self, |expander, (param, key)| expander.with_dependency(param, key))
    }

    pub fn type_key(&self) -> &TypeKey {
        &self.type_key
    }

    /// Declared dependencies as `(param, key)` pairs.
    pub fn dependencies(&self) -> &[(String, DependencyKey)] {
        &self.dependencies
    }

    pub(crate) fn expand(
        &self,
        graph: &Graph<'_>,
        request: &dyn Request,
        injected: &Injected<'_>,
    ) -> GraphResult<Value> {
        (self.expand)(graph, request, injected)
    }
}

impl fmt::Debug for Expander {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expander")
            .field("type_key", &self.type_key.to_string())
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// A family of expanders registered together, e.g. all expanders of one data source.
pub trait ExpanderGroup {
    fn expanders(&self) -> Expanders;
}

/// A possibly nested collection of expanders.
#[derive(Debug, Clone)]
pub enum Expanders {
    Single(Expander),
    Group(Vec<Expanders>),
}

impl Expanders {
    /// An empty collection.
    pub fn empty() -> Self {
        Self::Group(Vec::new())
    }

    /// Collects the expanders of a group.
    pub fn group(group: &impl ExpanderGroup) -> Self {
        group.expanders()
    }

    /// Walks every layer in order and returns the expanders it contains.
    pub fn flatten(self) -> Vec<Expander> {
        let mut flat = Vec::new();
        self.flatten_into(&mut flat);
        flat
    }

    fn flatten_into(self, flat: &mut Vec<Expander>) {
        match self {
            Self::Single(expander) => flat.push(expander),
            Self::Group(members) => {
                for member in members {
                    member.flatten_into(flat);
                }
            }
        }
    }
}

impl From<Expander> for Expanders {
    fn from(expander: Expander) -> Self {
        Self::Single(expander)
    }
}

impl<T: Into<Expanders>> From<Vec<T>> for Expanders {
    fn from(members: Vec<T>) -> Self {
        Self::Group(members.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Expanders>, const N: usize> From<[T; N]> for Expanders {
    fn from(members: [T; N]) -> Self {
        Self::Group(members.into_iter().map(Into::into).collect())
    }
}

impl FromIterator<Expander> for Expanders {
    fn from_iter<I: IntoIterator<Item = Expander>>(iter: I) -> Self {
        Self::Group(iter.into_iter().map(Self::Single).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(name: &str, value: i64) -> Expander {
        Expander::new(TypeKey::named(name), move |_, _, _| Ok(Value::Int(value)))
    }

    struct Pair;

    impl ExpanderGroup for Pair {
        fn expanders(&self) -> Expanders {
            [constant("D", 4), constant("E", 5)].into()
        }
    }

    #[test]
    fn test_flatten_walks_every_layer_in_order() {
        let expanders = Expanders::from(vec![
            Expanders::from(constant("A", 1)),
            Expanders::from([constant("B", 2), constant("C", 3)]),
            Expanders::group(&Pair),
        ]);

        let keys: Vec<_> = expanders
            .flatten()
            .iter()
            .map(|e| e.type_key().to_string())
            .collect();
        assert_eq!(keys, vec!["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn test_redeclared_dependency_replaces_previous() {
        let expander = constant("A", 1)
            .with_dependency("session", DependencyKey::named("primary"))
            .with_dependency("session", DependencyKey::named("replica"));
        assert_eq!(
            expander.dependencies(),
            &[("session".to_string(), DependencyKey::named("replica"))]
        );
    }
}
