//! Node Catalog
//!
//! The host decides which node types exist. It fills a [`Catalog`] with one
//! factory per type key and hands it to the graph; the graph never discovers
//! node types on its own.

use std::fmt;

use indexmap::IndexMap;

use super::Node;
use crate::builtin;

type Factory = Box<dyn Fn() -> Box<dyn Node> + Send + Sync>;

/// Registry mapping type keys to node factories.
#[derive(Default)]
pub struct Catalog {
    factories: IndexMap<String, Factory>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding every builtin node type.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        builtin::register(&mut catalog);
        catalog
    }

    /// Register (or replace) the factory for `type_key`.
    pub fn register<F>(&mut self, type_key: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Node> + Send + Sync + 'static,
    {
        self.factories.insert(type_key.into(), Box::new(factory));
        self
    }

    /// Build a fresh node of the given type.
    pub fn create(&self, type_key: &str) -> Option<Box<dyn Node>> {
        self.factories.get(type_key).map(|factory| factory())
    }

    pub fn contains(&self, type_key: &str) -> bool {
        self.factories.contains_key(type_key)
    }

    /// Registered type keys, in registration order.
    pub fn type_keys(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("type_keys", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
