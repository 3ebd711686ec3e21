//! Component registry.
//!
//! The registry is assembled once at startup with [`RegistryBuilder`] and is
//! read-only afterwards; commands receive it by reference (or `Arc`) and ask
//! it for a [`Bundler`] per component.

use super::{Component, cert_manager, gpu_operator, network_operator, nvsentinel, skyhook};
use crate::bundler::{Bundler, Error, Result, Settings};
use std::collections::BTreeMap;

/// Immutable `name -> component` table.
pub struct ComponentRegistry {
    components: BTreeMap<&'static str, Box<dyn Component>>,
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("components", &self.names())
            .finish()
    }
}

impl ComponentRegistry {
    /// Registry containing every built-in component.
    pub fn builtin() -> Result<Self> {
        RegistryBuilder::new()
            .register(cert_manager::CertManager)
            .register(gpu_operator::GpuOperator)
            .register(network_operator::NetworkOperator)
            .register(nvsentinel::NvSentinel)
            .register(skyhook::Skyhook)
            .build()
    }

    /// Looks up a component by name.
    pub fn get(&self, name: &str) -> Option<&dyn Component> {
        self.components.get(name).map(|c| c.as_ref())
    }

    /// Returns true if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Registered component names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.components.keys().copied().collect()
    }

    /// Creates the assembly orchestrator for `name`.
    ///
    /// # Errors
    ///
    /// Returns an invalid-request error if no such component is registered.
    pub fn bundler<'a>(&'a self, name: &str, settings: &'a Settings) -> Result<Bundler<'a>> {
        let component = self.get(name).ok_or_else(|| {
            Error::InvalidRequest(format!(
                "unknown component `{name}` (known: {})",
                self.names().join(", ")
            ))
        })?;
        Ok(Bundler::new(component, settings))
    }
}

/// Collects components before freezing them into a [`ComponentRegistry`].
#[derive(Default)]
pub struct RegistryBuilder {
    components: Vec<Box<dyn Component>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a component.
    pub fn register(mut self, component: impl Component + 'static) -> Self {
        self.components.push(Box::new(component));
        self
    }

    /// Freezes the registry.
    ///
    /// # Errors
    ///
    /// Returns an error if two components share a name.
    pub fn build(self) -> Result<ComponentRegistry> {
        let mut components = BTreeMap::new();
        for component in self.components {
            let name = component.descriptor().name;
            if components.insert(name, component).is_some() {
                return Err(Error::InvalidRequest(format!(
                    "component `{name}` registered twice"
                )));
            }
        }
        Ok(ComponentRegistry { components })
    }
}
