//! Singleton registry of Components: name uniqueness, forward/reverse
//! dependency edges, and cascaded start/stop/pause/resume/shutdown.
//!
//! Mirrors `deluge.component_async.ComponentRegistry`. Guarded with
//! `tokio::sync::RwLock` rather than assumed single-threaded, since this
//! port targets a multi-threaded Tokio runtime (`spec.md` §5's explicit
//! requirement for that case).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_recursion::async_recursion;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::component::Component;
use crate::error::{Error, Result};

/// Holds all Components for one process (or one isolated test scope) and
/// the reverse dependency edges derived from their `depend` lists.
#[derive(Default)]
pub struct Registry {
    components: RwLock<IndexMap<String, Arc<Component>>>,
    dependents: RwLock<HashMap<String, Vec<String>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `component`, failing with `AlreadyRegistered` on a
    /// duplicate name. Returns a shared handle so the caller can drive
    /// individual transitions directly.
    pub async fn register(&self, component: Component) -> Result<Arc<Component>> {
        let name = component.name().to_string();
        let mut components = self.components.write().await;
        if components.contains_key(&name) {
            return Err(Error::AlreadyRegistered(name));
        }
        let depend = component.depend().to_vec();
        let handle = Arc::new(component);
        components.insert(name.clone(), handle.clone());
        drop(components);

        if !depend.is_empty() {
            let mut dependents = self.dependents.write().await;
            for d in depend {
                dependents.entry(d).or_default().push(name.clone());
            }
        }
        Ok(handle)
    }

    /// Deregister a previously-registered Component by name, issuing a
    /// stop cascade first unless it is already `Shutdown`. Also prunes
    /// this name out of every reverse-dependency list it appears in —
    /// the original leaves these dangling, which is harmless (absent
    /// names are skipped during cascades) but an unbounded leak in a
    /// long-running process.
    pub async fn deregister(&self, name: &str) -> Result<()> {
        let component = self.get(name).await?;

        if component.state() != crate::component::State::Shutdown {
            tracing::debug!(component = name, "deregistering: forcing stop first");
            self.stop(Some(vec![name.to_string()])).await?;
        }

        let mut components = self.components.write().await;
        components
            .shift_remove(name)
            .ok_or_else(|| Error::NotRegistered(name.to_string()))?;
        drop(components);

        let mut dependents = self.dependents.write().await;
        dependents.remove(name);
        for list in dependents.values_mut() {
            list.retain(|n| n != name);
        }
        dependents.retain(|_, list| !list.is_empty());
        Ok(())
    }

    /// Look up a registered Component by name, or `None` if absent.
    pub async fn get_opt(&self, name: &str) -> Option<Arc<Component>> {
        self.components.read().await.get(name).cloned()
    }

    /// Look up a registered Component by name, surfacing `NotRegistered`
    /// rather than requiring the caller to handle an `Option` at every
    /// call site that treats absence as an error.
    pub async fn get(&self, name: &str) -> Result<Arc<Component>> {
        self.get_opt(name)
            .await
            .ok_or_else(|| Error::NotRegistered(name.to_string()))
    }

    async fn all_names(&self) -> Vec<String> {
        self.components.read().await.keys().cloned().collect()
    }

    /// Start `names` (all registered components if `None`), recursing
    /// depth-first, left-to-right into each component's declared
    /// dependencies before starting it. A dependency cycle is broken by
    /// skipping a name already in progress on the current call's walk.
    pub async fn start(&self, names: Option<Vec<String>>) -> Result<()> {
        let names = match names {
            Some(n) => n,
            None => self.all_names().await,
        };
        let mut visiting = HashSet::new();
        for name in names {
            self.start_one(&name, &mut visiting).await?;
        }
        Ok(())
    }

    #[async_recursion]
    async fn start_one(&self, name: &str, visiting: &mut HashSet<String>) -> Result<()> {
        if !visiting.insert(name.to_string()) {
            return Ok(());
        }
        let component = self.get(name).await?;
        let depend = component.depend().to_vec();
        for dep in depend {
            self.start_one(&dep, visiting).await?;
        }
        component.start().await
    }

    /// Stop `names` (all registered components if `None`), recursing
    /// into each component's *dependents* (reverse edges) before
    /// stopping it. Names absent from the registry are silently
    /// skipped, supporting concurrent deregistration.
    pub async fn stop(&self, names: Option<Vec<String>>) -> Result<()> {
        let names = match names {
            Some(n) => n,
            None => self.all_names().await,
        };
        let mut visiting = HashSet::new();
        for name in names {
            self.stop_one(&name, &mut visiting).await?;
        }
        Ok(())
    }

    #[async_recursion]
    async fn stop_one(&self, name: &str, visiting: &mut HashSet<String>) -> Result<()> {
        if !visiting.insert(name.to_string()) {
            return Ok(());
        }
        let Some(component) = self.get_opt(name).await else {
            return Ok(());
        };
        let dependents = self.dependents.read().await.get(name).cloned();
        if let Some(dependents) = dependents {
            for dependent in dependents {
                self.stop_one(&dependent, visiting).await?;
            }
        }
        component.stop().await
    }

    /// Pause each named Component (all registered ones if `None`).
    /// Does not cascade over dependencies.
    pub async fn pause(&self, names: Option<Vec<String>>) -> Result<()> {
        let names = match names {
            Some(n) => n,
            None => self.all_names().await,
        };
        for name in names {
            let component = self.get(&name).await?;
            component.pause().await?;
        }
        Ok(())
    }

    /// Resume each named Component (all registered ones if `None`).
    /// Does not cascade over dependencies.
    pub async fn resume(&self, names: Option<Vec<String>>) -> Result<()> {
        let names = match names {
            Some(n) => n,
            None => self.all_names().await,
        };
        for name in names {
            let component = self.get(&name).await?;
            component.resume().await?;
        }
        Ok(())
    }

    /// Stop all components, then concurrently shut every one of them
    /// down and await completion.
    pub async fn shutdown(&self) -> Result<()> {
        self.stop(None).await?;
        let handles: Vec<Arc<Component>> =
            self.components.read().await.values().cloned().collect();
        let results = futures::future::join_all(handles.iter().map(|c| c.shutdown())).await;
        for result in results {
            result?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, NoopHooks, DEFAULT_INTERVAL};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHooks {
        start_count: AtomicUsize,
        stop_count: AtomicUsize,
    }

    impl CountingHooks {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                start_count: AtomicUsize::new(0),
                stop_count: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl crate::component::ComponentHooks for CountingHooks {
        async fn start(&self) -> anyhow::Result<()> {
            self.start_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn stop(&self) -> anyhow::Result<()> {
            self.stop_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn duplicate_name_fails() {
        let registry = Registry::new();
        registry
            .register(Component::new(
                "x",
                DEFAULT_INTERVAL,
                vec![],
                Arc::new(NoopHooks),
            ))
            .await
            .unwrap();
        let err = registry
            .register(Component::new(
                "x",
                DEFAULT_INTERVAL,
                vec![],
                Arc::new(NoopHooks),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyRegistered(n) if n == "x"));
    }

    #[tokio::test]
    async fn start_cascades_dependencies() {
        let registry = Registry::new();
        let h1 = CountingHooks::new();
        let h2 = CountingHooks::new();
        let h3 = CountingHooks::new();
        registry
            .register(Component::new("c1", DEFAULT_INTERVAL, vec![], h1.clone()))
            .await
            .unwrap();
        registry
            .register(Component::new(
                "c2",
                DEFAULT_INTERVAL,
                vec!["c1".into()],
                h2.clone(),
            ))
            .await
            .unwrap();
        registry
            .register(Component::new(
                "c3",
                DEFAULT_INTERVAL,
                vec!["c2".into()],
                h3.clone(),
            ))
            .await
            .unwrap();

        registry.start(Some(vec!["c2".into()])).await.unwrap();
        assert_eq!(h1.start_count.load(Ordering::SeqCst), 1);
        assert_eq!(h2.start_count.load(Ordering::SeqCst), 1);
        assert_eq!(h3.start_count.load(Ordering::SeqCst), 0);

        registry.start(Some(vec!["c3".into()])).await.unwrap();
        assert_eq!(h1.start_count.load(Ordering::SeqCst), 1);
        assert_eq!(h2.start_count.load(Ordering::SeqCst), 1);
        assert_eq!(h3.start_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stop_cascades_dependents() {
        let registry = Registry::new();
        let h1 = CountingHooks::new();
        let h2 = CountingHooks::new();
        let h3 = CountingHooks::new();
        registry
            .register(Component::new("c1", DEFAULT_INTERVAL, vec![], h1.clone()))
            .await
            .unwrap();
        registry
            .register(Component::new(
                "c2",
                DEFAULT_INTERVAL,
                vec!["c1".into()],
                h2.clone(),
            ))
            .await
            .unwrap();
        registry
            .register(Component::new(
                "c3",
                DEFAULT_INTERVAL,
                vec!["c2".into()],
                h3.clone(),
            ))
            .await
            .unwrap();

        registry.start(Some(vec!["c3".into()])).await.unwrap();
        registry.stop(Some(vec!["c2".into()])).await.unwrap();

        assert_eq!(h3.stop_count.load(Ordering::SeqCst), 1);
        assert_eq!(h2.stop_count.load(Ordering::SeqCst), 1);
        assert_eq!(h1.stop_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn shutdown_is_terminal() {
        let registry = Registry::new();
        registry
            .register(Component::new(
                "x",
                DEFAULT_INTERVAL,
                vec![],
                Arc::new(NoopHooks),
            ))
            .await
            .unwrap();
        registry.shutdown().await.unwrap();
        let err = registry
            .start(Some(vec!["x".into()]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::WrongState { .. }));
    }

    #[tokio::test]
    async fn stop_skips_absent_names() {
        let registry = Registry::new();
        registry.stop(Some(vec!["nonexistent".into()])).await.unwrap();
    }

    #[tokio::test]
    async fn deregister_forces_stop_and_prunes_reverse_edges() {
        let registry = Registry::new();
        let h1 = CountingHooks::new();
        let h2 = CountingHooks::new();
        registry
            .register(Component::new("c1", DEFAULT_INTERVAL, vec![], h1.clone()))
            .await
            .unwrap();
        registry
            .register(Component::new(
                "c2",
                DEFAULT_INTERVAL,
                vec!["c1".into()],
                h2.clone(),
            ))
            .await
            .unwrap();

        registry.start(Some(vec!["c2".into()])).await.unwrap();
        let c2 = registry.get("c2").await.unwrap();
        registry.deregister("c2").await.unwrap();
        assert_eq!(h2.stop_count.load(Ordering::SeqCst), 1);
        assert!(registry.get_opt("c2").await.is_none());
        assert_eq!(c2.state(), crate::component::State::Stopped);

        // c1's dependents list must no longer mention c2.
        registry.stop(Some(vec!["c1".into()])).await.unwrap();
        assert_eq!(h1.stop_count.load(Ordering::SeqCst), 1);

        let err = registry.deregister("c2").await.unwrap_err();
        assert!(matches!(err, Error::NotRegistered(n) if n == "c2"));
    }
}
