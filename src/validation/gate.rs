//! Console visibility gate.
//!
//! Decides at call time whether validation diagnostics may be emitted. The
//! validator holds the gate it was built with; nothing here is global.

use crate::config::{ConfigSource, Environment};
use std::sync::Arc;
use tracing::debug;

pub trait ConsoleGate: Send + Sync {
    fn should_show_console(&self) -> bool;
}

impl<G: ConsoleGate + ?Sized> ConsoleGate for Arc<G> {
    fn should_show_console(&self) -> bool {
        (**self).should_show_console()
    }
}

impl<G: ConsoleGate + ?Sized> ConsoleGate for Box<G> {
    fn should_show_console(&self) -> bool {
        (**self).should_show_console()
    }
}

/// Always answers the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticGate(pub bool);

impl StaticGate {
    pub fn open() -> Self {
        Self(true)
    }

    pub fn closed() -> Self {
        Self(false)
    }
}

impl ConsoleGate for StaticGate {
    fn should_show_console(&self) -> bool {
        self.0
    }
}

/// Open unless the process environment names production.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentGate;

impl ConsoleGate for EnvironmentGate {
    fn should_show_console(&self) -> bool {
        !Environment::from_process_env().is_production()
    }
}

/// Reads `showConsole` from a configuration source on every call.
///
/// A source that cannot answer falls back to [`EnvironmentGate`].
#[derive(Debug, Clone)]
pub struct ConfigGate<S> {
    source: S,
}

impl<S: ConfigSource> ConfigGate<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S: ConfigSource> ConsoleGate for ConfigGate<S> {
    fn should_show_console(&self) -> bool {
        match self.source.show_console() {
            Ok(show) => show,
            Err(err) => {
                debug!(error = %err, "config unavailable, falling back to environment gate");
                EnvironmentGate.should_show_console()
            }
        }
    }
}
