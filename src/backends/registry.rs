//! # Backend Registry
//!
//! Backends are registered by name together with their option group and a
//! factory. Selecting a backend is a lookup; an unknown name fails the same
//! way no matter which names are registered.
//!
//! Registration order is kept: it is the order backend option groups appear
//! in help output.

use super::Backend;
use super::launchdarkly::{self, LaunchDarklyConfig};
use crate::cli::flags::{FlagGroup, ParsedFlags};
use crate::context::Context;
use crate::environment::Environment;
use crate::error::{FlagonError, Result};
use std::sync::Arc;

/// Everything a backend may read while it is being constructed.
pub struct BackendInputs<'a> {
    pub ctx: &'a Context,
    pub env: &'a Environment,
    /// Parsed command line, when parsing has happened.
    pub flags: Option<&'a ParsedFlags>,
}

/// Factory function for creating backend instances
pub type BackendFactory = Box<dyn Fn(&BackendInputs<'_>) -> Result<Arc<dyn Backend>> + Send + Sync>;

struct Registration {
    name: String,
    flags: FlagGroup,
    factory: BackendFactory,
}

pub struct BackendRegistry {
    backends: Vec<Registration>,
}

impl BackendRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    /// Registry with every built-in backend.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_defaults();
        registry
    }

    /// Register a backend. Registering an existing name replaces it in place.
    pub fn register<F>(&mut self, name: &str, flags: FlagGroup, factory: F)
    where
        F: Fn(&BackendInputs<'_>) -> Result<Arc<dyn Backend>> + Send + Sync + 'static,
    {
        let registration = Registration {
            name: name.to_string(),
            flags,
            factory: Box::new(factory),
        };

        match self.backends.iter_mut().find(|r| r.name == name) {
            Some(existing) => *existing = registration,
            None => self.backends.push(registration),
        }
    }

    /// Construct the backend registered as `name`.
    pub fn create(&self, name: &str, inputs: &BackendInputs<'_>) -> Result<Arc<dyn Backend>> {
        let Some(registration) = self.backends.iter().find(|r| r.name == name) else {
            tracing::debug!(requested = name, available = ?self.names(), "no such backend");
            return Err(FlagonError::UnsupportedBackend(name.to_string()));
        };

        (registration.factory)(inputs)
    }

    pub fn names(&self) -> Vec<String> {
        self.backends.iter().map(|r| r.name.clone()).collect()
    }

    /// Option groups of every registered backend, in registration order.
    pub fn flag_groups(&self) -> Vec<FlagGroup> {
        self.backends.iter().map(|r| r.flags.clone()).collect()
    }

    /// Register all default backends
    pub fn register_defaults(&mut self) {
        self.register(
            launchdarkly::BACKEND_NAME,
            LaunchDarklyConfig::flags(),
            |inputs| {
                let config = LaunchDarklyConfig::resolve(inputs.env, inputs.flags);
                let backend = launchdarkly::LaunchDarklyBackend::connect(inputs.ctx, config)?;
                Ok(Arc::new(backend) as Arc<dyn Backend>)
            },
        );
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
