//! Per-run registry of live model instances.

use std::collections::BTreeMap;

use crate::model::Model;

/// Live model instances keyed by scenario model name.
///
/// Owned by exactly one scheduler for the lifetime of one run; nothing in it
/// outlives the run.
#[derive(Default)]
pub struct ComponentRegistry {
    models: BTreeMap<String, Box<dyn Model>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an instance, returning the one it replaced, if any.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        model: Box<dyn Model>,
    ) -> Option<Box<dyn Model>> {
        self.models.insert(name.into(), model)
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, model: impl Model + 'static) -> Self {
        self.insert(name, Box::new(model));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn Model + 'static)> {
        self.models.get_mut(name).map(|m| m.as_mut())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .finish()
    }
}
