//! Dependency injection for expanders.
//!
//! A graph borrows its dependencies, so resources such as a database session
//! are owned by the caller and cannot be outlived by the graph.

use graphlayer_core::{GraphError, GraphResult};
use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// The key a dependency is bound under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DependencyKey {
    /// Keyed by the Rust type of the dependency.
    Type { id: TypeId, name: &'static str },
    /// Keyed by an explicit name, for several dependencies of the same type.
    Named(Arc<str>),
}

impl DependencyKey {
    /// Key for a dependency of type `T`.
    pub fn of<T: Any>() -> Self {
        Self::Type {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn named(name: &str) -> Self {
        Self::Named(name.into())
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type { name, .. } => write!(f, "{name}"),
            Self::Named(name) => write!(f, "{name}"),
        }
    }
}

/// The dependency map supplied when a graph is created.
#[derive(Default, Clone)]
pub struct Dependencies<'a> {
    data: FxHashMap<DependencyKey, &'a (dyn Any + Send + Sync)>,
}

impl<'a> Dependencies<'a> {
    /// Creates an empty dependency map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a dependency under its type.
    ///
    /// If a dependency of the same type is already bound, it is replaced.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: &'a T) {
        self.data.insert(DependencyKey::of::<T>(), value);
    }

    /// Binds a dependency under an explicit key.
    pub fn insert_keyed<T: Any + Send + Sync>(&mut self, key: DependencyKey, value: &'a T) {
        self.data.insert(key, value);
    }

    /// Gets a dependency by type.
    pub fn get<T: Any>(&self) -> Option<&'a T> {
        self.data
            .get(&DependencyKey::of::<T>())
            .copied()
            .and_then(|value| value.downcast_ref())
    }

    pub(crate) fn get_raw(&self, key: &DependencyKey) -> Option<&'a (dyn Any + Send + Sync)> {
        self.data.get(key).copied()
    }

    pub fn contains(&self, key: &DependencyKey) -> bool {
        self.data.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Adds a dependency and returns self.
    pub fn with<T: Any + Send + Sync>(mut self, value: &'a T) -> Self {
        self.insert(value);
        self
    }

    /// Adds a dependency under an explicit key and returns self.
    pub fn with_keyed<T: Any + Send + Sync>(mut self, key: DependencyKey, value: &'a T) -> Self {
        self.insert_keyed(key, value);
        self
    }
}

impl fmt::Debug for Dependencies<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependencies")
            .field("keys", &self.data.keys().map(ToString::to_string).collect::<Vec<_>>())
            .finish()
    }
}

/// The dependencies injected into one expander call, by local parameter name.
#[derive(Default)]
pub struct Injected<'a> {
    values: Vec<(&'a str, &'a (dyn Any + Send + Sync))>,
}

impl<'a> Injected<'a> {
    /// Creates an empty injection, for expanders that declare no dependencies.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Looks up every declared dependency in `dependencies`.
    pub(crate) fn resolve(
        declared: &'a [(String, DependencyKey)],
        dependencies: &Dependencies<'a>,
    ) -> GraphResult<Self> {
        let values = declared
            .iter()
            .map(|(param, key)| {
                dependencies
                    .get_raw(key)
                    .map(|value| (param.as_str(), value))
                    .ok_or_else(|| GraphError::MissingDependency {
                        key: key.to_string(),
                    })
            })
            .collect::<GraphResult<Vec<_>>>()?;
        Ok(Self { values })
    }

    /// Gets an injected dependency by its local parameter name.
    pub fn get<T: Any>(&self, param: &str) -> GraphResult<&'a T> {
        let value = self
            .values
            .iter()
            .find(|(name, _)| *name == param)
            .map(|(_, value)| *value)
            .ok_or_else(|| GraphError::UndeclaredDependency {
                param: param.to_string(),
            })?;
        value
            .downcast_ref()
            .ok_or_else(|| GraphError::DependencyType {
                param: param.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Injected<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injected")
            .field("params", &self.values.iter().map(|(name, _)| *name).collect::<Vec<_>>())
            .finish()
    }
}
