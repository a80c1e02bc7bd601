//! A single named service's lifecycle state machine and periodic timer.
//!
//! Mirrors `deluge.component_async.Component`: nine states, six
//! user-overridable hooks, and a mutual-exclusion guard held for the
//! duration of each transition.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::timer::PeriodicTimer;

/// The default interval for a Component's periodic `update` hook.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// One of the nine states a Component can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum State {
    Stopped = 0,
    Starting = 1,
    Started = 2,
    Stopping = 3,
    Pausing = 4,
    Paused = 5,
    Resuming = 6,
    ShuttingDown = 7,
    Shutdown = 8,
}

impl State {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => State::Stopped,
            1 => State::Starting,
            2 => State::Started,
            3 => State::Stopping,
            4 => State::Pausing,
            5 => State::Paused,
            6 => State::Resuming,
            7 => State::ShuttingDown,
            _ => State::Shutdown,
        }
    }
}

/// Six user-overridable behaviors invoked during Component transitions.
///
/// Default bodies are no-ops, matching the Python base class. Hook
/// implementations MUST NOT re-enter the Registry: doing so risks a
/// deadlock on this Component's own guard or a recursive cascade.
#[async_trait]
pub trait ComponentHooks: Send + Sync {
    async fn start(&self) -> anyhow::Result<()> {
        Ok(())
    }
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
    async fn update(&self) -> anyhow::Result<()> {
        Ok(())
    }
    async fn pause(&self) -> anyhow::Result<()> {
        Ok(())
    }
    async fn resume(&self) -> anyhow::Result<()> {
        Ok(())
    }
    async fn shutdown(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// The all-no-op hook set, used when a Component needs no custom behavior
/// beyond its periodic timer.
pub struct NoopHooks;

#[async_trait]
impl ComponentHooks for NoopHooks {}

const START_ACCEPTED: &[State] = &[State::Stopped, State::Starting, State::Started];
const STOP_ACCEPTED: &[State] = &[
    State::Started,
    State::Paused,
    State::Stopping,
    State::Stopped,
];
const PAUSE_ACCEPTED: &[State] = &[State::Started, State::Pausing, State::Paused];
const RESUME_ACCEPTED: &[State] = &[State::Paused, State::Resuming, State::Started];

/// A named service with a state machine, a dependency list, and a bound
/// periodic timer.
pub struct Component {
    name: String,
    interval: Duration,
    depend: Vec<String>,
    state: AtomicU8,
    // Holds the periodic timer and doubles as the transition exclusion
    // guard: the entire body of a transition (hook + timer manipulation)
    // runs with this lock held, so state changes only ever happen while
    // it is held (construction's initial Stopped assignment excepted).
    guard: Mutex<PeriodicTimer>,
    hooks: Arc<dyn ComponentHooks>,
}

impl Component {
    /// Build a Component. Does not register it with any Registry —
    /// callers use `Registry::register` (or `Context::component`) to do
    /// that, since auto-registration at construction time would make
    /// Components inseparable from a single global registry.
    pub fn new(
        name: impl Into<String>,
        interval: Duration,
        depend: Vec<String>,
        hooks: Arc<dyn ComponentHooks>,
    ) -> Self {
        let hooks_for_timer = hooks.clone();
        let timer = PeriodicTimer::new(move || {
            let hooks = hooks_for_timer.clone();
            async move {
                if let Err(e) = hooks.update().await {
                    tracing::error!(error = %e, "component update hook failed");
                }
            }
        });
        Self {
            name: name.into(),
            interval,
            depend,
            state: AtomicU8::new(State::Stopped as u8),
            guard: Mutex::new(timer),
            hooks,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn depend(&self) -> &[String] {
        &self.depend
    }

    pub fn state(&self) -> State {
        State::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: State) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// start → Started. No-op success if already Started.
    pub async fn start(&self) -> Result<()> {
        let current = self.state();
        if !START_ACCEPTED.contains(&current) {
            return Err(Error::WrongState {
                current,
                accepted: START_ACCEPTED,
            });
        }

        let mut timer = self.guard.lock().await;
        if self.state() == State::Started {
            return Ok(());
        }
        self.set_state(State::Starting);
        self.hooks.start().await?;
        self.set_state(State::Started);
        timer.start(self.interval, true)?;
        Ok(())
    }

    /// stop → Stopped. No-op success if already Stopped.
    pub async fn stop(&self) -> Result<()> {
        let current = self.state();
        if !STOP_ACCEPTED.contains(&current) {
            return Err(Error::WrongState {
                current,
                accepted: STOP_ACCEPTED,
            });
        }
        self.stop_locked().await
    }

    async fn stop_locked(&self) -> Result<()> {
        let mut timer = self.guard.lock().await;
        if self.state() == State::Stopped {
            return Ok(());
        }
        self.set_state(State::Stopping);
        self.hooks.stop().await?;
        match timer.stop().await {
            Ok(()) | Err(Error::NotRunning) => {}
            Err(e) => return Err(e),
        }
        self.set_state(State::Stopped);
        Ok(())
    }

    /// pause → Paused. No-op success if already Paused.
    pub async fn pause(&self) -> Result<()> {
        let current = self.state();
        if !PAUSE_ACCEPTED.contains(&current) {
            return Err(Error::WrongState {
                current,
                accepted: PAUSE_ACCEPTED,
            });
        }

        let mut timer = self.guard.lock().await;
        if self.state() == State::Paused {
            return Ok(());
        }
        self.set_state(State::Pausing);
        self.hooks.pause().await?;
        timer.stop().await?;
        self.set_state(State::Paused);
        Ok(())
    }

    /// resume → Started. No-op success if already Started.
    pub async fn resume(&self) -> Result<()> {
        let current = self.state();
        if !RESUME_ACCEPTED.contains(&current) {
            return Err(Error::WrongState {
                current,
                accepted: RESUME_ACCEPTED,
            });
        }

        let mut timer = self.guard.lock().await;
        if self.state() == State::Started {
            return Ok(());
        }
        self.set_state(State::Resuming);
        self.hooks.resume().await?;
        timer.start(self.interval, true)?;
        self.set_state(State::Started);
        Ok(())
    }

    /// shutdown → Shutdown, terminal. Accepted from any state. Forces a
    /// stop cascade first unless already Stopped or Shutdown. Idempotent
    /// once Shutdown has been reached.
    pub async fn shutdown(&self) -> Result<()> {
        if !matches!(self.state(), State::Stopped | State::Shutdown) {
            self.stop_locked().await?;
        }

        let _timer = self.guard.lock().await;
        if self.state() == State::Shutdown {
            return Ok(());
        }
        self.set_state(State::ShuttingDown);
        self.hooks.shutdown().await?;
        self.set_state(State::Shutdown);
        Ok(())
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("depend", &self.depend)
            .finish()
    }
}
