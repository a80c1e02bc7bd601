//! Core lifecycle and transport subsystem for a peer-to-peer client's
//! control plane.
//!
//! Two independent pieces:
//!
//! - [`component`] / [`registry`]: a registry of long-lived named
//!   services, each a finite state machine with dependency ordering and
//!   a periodic update timer.
//! - [`framing`]: a versioned, compressed, length-prefixed framing
//!   protocol for exchanging codec-serialized objects over a byte stream.
//!
//! Network transport establishment, persistent storage, authentication,
//! and request/response correlation are out of scope — higher-level
//! concerns built atop these primitives.

pub mod component;
pub mod config;
pub mod context;
pub mod error;
pub mod framing;
pub mod registry;
pub mod timer;

use std::sync::{Arc, LazyLock};

pub use component::{Component, ComponentHooks, NoopHooks, State};
pub use context::Context;
pub use error::{Error, Result};
pub use registry::Registry;
pub use timer::PeriodicTimer;

/// The process-wide default Registry, used by the free functions below
/// for call-site parity with the original single-singleton design.
/// Prefer [`Context`] when isolation (tests, multiple independent
/// registries per process) matters.
static DEFAULT_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Access the process-wide default Registry directly.
pub fn default_registry() -> &'static Registry {
    &DEFAULT_REGISTRY
}

/// Register a Component with the default Registry.
pub async fn register(component: Component) -> Result<Arc<Component>> {
    default_registry().register(component).await
}

/// Deregister a Component from the default Registry by name.
pub async fn deregister(name: &str) -> Result<()> {
    default_registry().deregister(name).await
}

/// Start `names` (all, if `None`) on the default Registry.
pub async fn start(names: Option<Vec<String>>) -> Result<()> {
    default_registry().start(names).await
}

/// Stop `names` (all, if `None`) on the default Registry.
pub async fn stop(names: Option<Vec<String>>) -> Result<()> {
    default_registry().stop(names).await
}

/// Pause `names` (all, if `None`) on the default Registry.
pub async fn pause(names: Option<Vec<String>>) -> Result<()> {
    default_registry().pause(names).await
}

/// Resume `names` (all, if `None`) on the default Registry.
pub async fn resume(names: Option<Vec<String>>) -> Result<()> {
    default_registry().resume(names).await
}

/// Shut down every Component on the default Registry.
pub async fn shutdown() -> Result<()> {
    default_registry().shutdown().await
}

/// Look up a Component on the default Registry by name, or `None` if
/// absent.
pub async fn get_opt(name: &str) -> Option<Arc<Component>> {
    default_registry().get_opt(name).await
}

/// Look up a Component on the default Registry by name, surfacing
/// `Error::NotRegistered` if absent.
pub async fn get(name: &str) -> Result<Arc<Component>> {
    default_registry().get(name).await
}

/// Install a `tracing` subscriber reading `RUST_LOG` (or `info` if unset).
/// Call once at process start; safe to skip entirely if the host
/// application installs its own subscriber.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
