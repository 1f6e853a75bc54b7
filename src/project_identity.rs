//! Central project identity contract.
//!
//! Runtime names and environment variable keys live here so the binary,
//! the help text and the tests agree on them.

pub const DISPLAY_NAME: &str = "Flagon";
pub const BINARY_NAME: &str = "flagon";
pub const ENV_PREFIX: &str = "FLAGON";

/// Backend used when neither the environment nor `--backend` picks one.
pub const DEFAULT_BACKEND: &str = "launchdarkly";

/// Inbound W3C trace context.
pub const TRACE_PARENT_ENV: &str = "TRACEPARENT";

pub fn env_key(suffix: &str) -> String {
    format!("{}_{}", ENV_PREFIX, suffix)
}

pub fn backend_env_key() -> String {
    env_key("BACKEND")
}

pub fn log_env_key() -> String {
    env_key("LOG")
}

pub fn cli_with(args: &str) -> String {
    format!("{} {}", BINARY_NAME, args)
}
