//! Model type registry: declared `type` name -> constructor.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use gs_graph::{ModelSpec, ScenarioConfig};
use gs_sim::{ComponentRegistry, Model};
use tracing::debug;

use crate::battery::Battery;
use crate::constant::Constant;
use crate::controller::Controller;
use crate::error::{FactoryError, FactoryResult};
use crate::profile::Profile;

type Constructor = dyn Fn(&ModelSpec) -> FactoryResult<Box<dyn Model>> + Send + Sync;

/// Instantiates models by their declared type.
///
/// Cheap to clone and shareable across batch workers; every call to
/// [`build_registry`](Self::build_registry) creates fresh instances.
#[derive(Clone, Default)]
pub struct ModelFactory {
    constructors: BTreeMap<String, Arc<Constructor>>,
}

impl ModelFactory {
    /// An empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory knowing `constant`, `profile`, `battery` and `controller`.
    pub fn with_builtins() -> Self {
        let mut factory = Self::new();
        factory.register("constant", |spec| Ok(Box::new(Constant::from_spec(spec)?)));
        factory.register("profile", |spec| Ok(Box::new(Profile::from_spec(spec)?)));
        factory.register("battery", |spec| Ok(Box::new(Battery::from_spec(spec)?)));
        factory.register("controller", |spec| {
            Ok(Box::new(Controller::from_spec(spec)?))
        });
        factory
    }

    /// Register (or replace) the constructor for `kind`.
    pub fn register<F>(&mut self, kind: impl Into<String>, constructor: F)
    where
        F: Fn(&ModelSpec) -> FactoryResult<Box<dyn Model>> + Send + Sync + 'static,
    {
        self.constructors.insert(kind.into(), Arc::new(constructor));
    }

    pub fn supports(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn create(&self, spec: &ModelSpec) -> FactoryResult<Box<dyn Model>> {
        let constructor =
            self.constructors
                .get(&spec.kind)
                .ok_or_else(|| FactoryError::UnknownType {
                    model: spec.name.clone(),
                    kind: spec.kind.clone(),
                })?;
        constructor(spec)
    }

    /// Fresh instances for every model of a frozen scenario.
    pub fn build_registry(&self, config: &ScenarioConfig) -> FactoryResult<ComponentRegistry> {
        let mut registry = ComponentRegistry::new();
        for spec in config.models() {
            registry.insert(spec.name.clone(), self.create(spec)?);
        }
        debug!(
            scenario = config.name(),
            models = registry.len(),
            "registry built"
        );
        Ok(registry)
    }
}

impl fmt::Debug for ModelFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelFactory")
            .field("kinds", &self.kinds().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        let factory = ModelFactory::with_builtins();
        assert_eq!(
            factory.kinds().collect::<Vec<_>>(),
            vec!["battery", "constant", "controller", "profile"]
        );
    }

    #[test]
    fn unknown_type_is_reported() {
        let factory = ModelFactory::with_builtins();
        let spec = ModelSpec::time_based("wind", "turbine", 60).with_output("p");
        assert_eq!(
            factory.create(&spec).err(),
            Some(FactoryError::UnknownType {
                model: "wind".into(),
                kind: "turbine".into()
            })
        );
    }

    #[test]
    fn custom_constructor_replaces_builtin() {
        let mut factory = ModelFactory::with_builtins();
        factory.register("constant", |spec| {
            Err(FactoryError::Unsupported {
                model: spec.name.clone(),
                what: "disabled".into(),
            })
        });
        let spec = ModelSpec::time_based("c", "constant", 60)
            .with_output("p")
            .with_param("value", 1.0);
        assert!(factory.create(&spec).is_err());
    }
}
