//! # Feature Flag Backends
//!
//! A backend is a remote feature-flag service that commands talk to through
//! the [`Backend`] trait.
//!
//! ## Module Structure
//!
//! ### [`registry`] - Backend Registry
//!
//! Maps a backend name (the value of `--backend`) to its option group and its
//! constructor. Commands never name a concrete backend; they ask the
//! registry, through `Meta::create_backend`, for whichever one was selected.
//!
//! ### [`launchdarkly`] - LaunchDarkly
//!
//! The built-in provider. Talks to the LaunchDarkly REST API.
//!
//! ## Adding a New Backend
//!
//! 1. Create `src/backends/<name>/` with a type implementing [`Backend`]
//! 2. Give it a configuration type with defaults, environment and flag layers
//! 3. Register it in `BackendRegistry::register_defaults()`

pub mod launchdarkly;
#[cfg(test)]
pub(crate) mod memory;
pub mod registry;

pub use registry::{BackendFactory, BackendInputs, BackendRegistry};

use crate::context::Context;
use crate::error::{FlagonError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Flag keys become URL path segments; keep them to the characters flag
/// services allow.
static FLAG_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("Valid regex pattern"));

/// A feature flag as reported by a backend, scoped to one environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    pub key: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub kind: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub archived: bool,
    /// Whether targeting is on in the configured environment.
    pub enabled: bool,
}

/// Minimal on/off view of a flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagState {
    pub key: String,
    pub enabled: bool,
}

impl From<&Flag> for FlagState {
    fn from(flag: &Flag) -> Self {
        Self {
            key: flag.key.clone(),
            enabled: flag.enabled,
        }
    }
}

pub trait Backend: Send + Sync {
    /// Registry key of this backend.
    fn name(&self) -> &str;

    fn list_flags(&self, ctx: &Context) -> Result<Vec<Flag>>;

    /// Fails with [`FlagonError::FlagNotFound`] when the flag does not exist.
    fn get_flag(&self, ctx: &Context, key: &str) -> Result<Flag>;

    /// Turn the flag on or off in the configured environment and return its
    /// new state.
    fn set_enabled(
        &self,
        ctx: &Context,
        key: &str,
        enabled: bool,
        comment: Option<&str>,
    ) -> Result<Flag>;
}

pub fn validate_flag_key(key: &str) -> Result<()> {
    if FLAG_KEY_RE.is_match(key) {
        Ok(())
    } else {
        Err(FlagonError::Usage(format!("invalid flag key '{}'", key)))
    }
}
