//! Explicit, isolated lifecycle contexts, alongside the process-wide
//! default Registry reached through the free functions in the crate root.
//!
//! `spec.md` §9 calls the global singleton out as a design smell and
//! recommends "an explicit context passed to constructors... to allow
//! multiple isolated registries per process (e.g. for testing)" while
//! keeping the default-registry free functions for call-site parity with
//! the original. Both are provided here.

use std::sync::Arc;

use crate::component::{Component, ComponentHooks};
use crate::error::Result;
use crate::registry::Registry;

/// An isolated lifecycle scope: its own Registry, independent of the
/// process-wide default and of any other `Context`.
#[derive(Default)]
pub struct Context {
    registry: Registry,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Build and register a Component in one step.
    pub async fn component(
        &self,
        name: impl Into<String>,
        interval: std::time::Duration,
        depend: Vec<String>,
        hooks: Arc<dyn ComponentHooks>,
    ) -> Result<Arc<Component>> {
        self.registry
            .register(Component::new(name, interval, depend, hooks))
            .await
    }
}
