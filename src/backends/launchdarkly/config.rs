use crate::cli::flags::{FlagGroup, ParsedFlags};
use crate::environment::Environment;
use crate::error::{FlagonError, Result};
use clap::{Arg, value_parser};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://app.launchdarkly.com";
pub const DEFAULT_PROJECT: &str = "default";
pub const DEFAULT_ENVIRONMENT: &str = "production";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const ENV_ACCESS_TOKEN: &str = "LAUNCHDARKLY_ACCESS_TOKEN";
pub const ENV_BASE_URL: &str = "LAUNCHDARKLY_BASE_URL";
pub const ENV_PROJECT: &str = "LAUNCHDARKLY_PROJECT";
pub const ENV_ENVIRONMENT: &str = "LAUNCHDARKLY_ENVIRONMENT";
pub const ENV_TIMEOUT: &str = "LAUNCHDARKLY_TIMEOUT";

pub const FLAG_ACCESS_TOKEN: &str = "ld-access-token";
pub const FLAG_BASE_URL: &str = "ld-base-url";
pub const FLAG_PROJECT: &str = "ld-project";
pub const FLAG_ENVIRONMENT: &str = "ld-environment";
pub const FLAG_TIMEOUT: &str = "ld-timeout";

/// One layer of LaunchDarkly settings. `None` means "not set by this layer".
///
/// Layers are stacked with [`LaunchDarklyConfig::override_from`]:
/// defaults, then environment, then command-line flags. Values stay as text
/// until [`LaunchDarklyConfig::validate`], so a bad value in a layer that
/// loses is never looked at.
#[derive(Clone, Default, PartialEq)]
pub struct LaunchDarklyConfig {
    pub access_token: Option<String>,
    pub base_url: Option<String>,
    pub project: Option<String>,
    pub environment: Option<String>,
    /// Whole seconds.
    pub timeout: Option<String>,
}

impl LaunchDarklyConfig {
    pub fn default_config() -> Self {
        Self {
            access_token: None,
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            project: Some(DEFAULT_PROJECT.to_string()),
            environment: Some(DEFAULT_ENVIRONMENT.to_string()),
            timeout: Some(DEFAULT_TIMEOUT_SECS.to_string()),
        }
    }

    pub fn from_environment(env: &Environment) -> Self {
        Self {
            access_token: env.get(ENV_ACCESS_TOKEN).map(str::to_string),
            base_url: env.get(ENV_BASE_URL).map(str::to_string),
            project: env.get(ENV_PROJECT).map(str::to_string),
            environment: env.get(ENV_ENVIRONMENT).map(str::to_string),
            timeout: env.get(ENV_TIMEOUT).map(str::to_string),
        }
    }

    pub fn from_flags(flags: &ParsedFlags) -> Self {
        Self {
            access_token: flags.get_str(FLAG_ACCESS_TOKEN).map(str::to_string),
            base_url: flags.get_str(FLAG_BASE_URL).map(str::to_string),
            project: flags.get_str(FLAG_PROJECT).map(str::to_string),
            environment: flags.get_str(FLAG_ENVIRONMENT).map(str::to_string),
            timeout: flags.get_one::<u64>(FLAG_TIMEOUT).map(u64::to_string),
        }
    }

    /// Replace every field `other` sets.
    pub fn override_from(&mut self, other: &Self) {
        if let Some(v) = &other.access_token {
            self.access_token = Some(v.clone());
        }
        if let Some(v) = &other.base_url {
            self.base_url = Some(v.clone());
        }
        if let Some(v) = &other.project {
            self.project = Some(v.clone());
        }
        if let Some(v) = &other.environment {
            self.environment = Some(v.clone());
        }
        if let Some(v) = &other.timeout {
            self.timeout = Some(v.clone());
        }
    }

    /// Defaults, overridden by `env`, overridden by `flags`.
    pub fn resolve(env: &Environment, flags: Option<&ParsedFlags>) -> Self {
        let mut config = Self::default_config();
        config.override_from(&Self::from_environment(env));
        if let Some(flags) = flags {
            config.override_from(&Self::from_flags(flags));
        }
        config
    }

    /// Option group for `--help` and parsing. None of the options has a
    /// clap default, so an absent option never overrides lower layers.
    pub fn flags() -> FlagGroup {
        FlagGroup::new("LaunchDarkly Backend")
            .secret(
                Arg::new(FLAG_ACCESS_TOKEN)
                    .long(FLAG_ACCESS_TOKEN)
                    .value_name("token")
                    .help(format!("API access token [env {}]", ENV_ACCESS_TOKEN)),
            )
            .arg(
                Arg::new(FLAG_BASE_URL)
                    .long(FLAG_BASE_URL)
                    .value_name("url")
                    .help(format!(
                        "API base URL, default {} [env {}]",
                        DEFAULT_BASE_URL, ENV_BASE_URL
                    )),
            )
            .arg(
                Arg::new(FLAG_PROJECT)
                    .long(FLAG_PROJECT)
                    .value_name("key")
                    .help(format!(
                        "project key, default {} [env {}]",
                        DEFAULT_PROJECT, ENV_PROJECT
                    )),
            )
            .arg(
                Arg::new(FLAG_ENVIRONMENT)
                    .long(FLAG_ENVIRONMENT)
                    .value_name("key")
                    .help(format!(
                        "environment key, default {} [env {}]",
                        DEFAULT_ENVIRONMENT, ENV_ENVIRONMENT
                    )),
            )
            .arg(
                Arg::new(FLAG_TIMEOUT)
                    .long(FLAG_TIMEOUT)
                    .value_name("seconds")
                    .value_parser(value_parser!(u64))
                    .help(format!(
                        "request timeout, default {} [env {}]",
                        DEFAULT_TIMEOUT_SECS, ENV_TIMEOUT
                    )),
            )
    }

    /// Check the merged layers and produce connection settings.
    pub fn validate(&self) -> Result<ConnectionSettings> {
        let access_token = required(&self.access_token, "access token", ENV_ACCESS_TOKEN)?;
        let project = required(&self.project, "project key", ENV_PROJECT)?;
        let environment = required(&self.environment, "environment key", ENV_ENVIRONMENT)?;
        let base_url = required(&self.base_url, "base URL", ENV_BASE_URL)?;

        let parsed = reqwest::Url::parse(&base_url).map_err(|e| {
            FlagonError::BackendConfig(format!("invalid base URL '{}': {}", base_url, e))
        })?;
        if parsed.scheme() != "https" && parsed.scheme() != "http" {
            return Err(FlagonError::BackendConfig(format!(
                "base URL must use http or https (got '{}')",
                parsed.scheme()
            )));
        }

        let timeout_secs = match self.timeout.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_TIMEOUT_SECS,
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                FlagonError::BackendConfig(format!(
                    "timeout must be a whole number of seconds (got '{}')",
                    raw
                ))
            })?,
        };
        if timeout_secs == 0 {
            return Err(FlagonError::BackendConfig(
                "timeout must be at least one second".to_string(),
            ));
        }

        Ok(ConnectionSettings {
            access_token,
            base_url: base_url.trim_end_matches('/').to_string(),
            project,
            environment,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn required(value: &Option<String>, what: &str, env_key: &str) -> Result<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            FlagonError::BackendConfig(format!(
                "LaunchDarkly {} is not set (use {} or --ld-*)",
                what, env_key
            ))
        })
}

impl fmt::Debug for LaunchDarklyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchDarklyConfig")
            .field("access_token", &self.access_token.as_ref().map(|_| "[redacted]"))
            .field("base_url", &self.base_url)
            .field("project", &self.project)
            .field("environment", &self.environment)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Validated settings the client connects with.
#[derive(Clone, PartialEq)]
pub struct ConnectionSettings {
    pub access_token: String,
    /// No trailing slash.
    pub base_url: String,
    pub project: String,
    pub environment: String,
    pub timeout: Duration,
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("access_token", &"[redacted]")
            .field("base_url", &self.base_url)
            .field("project", &self.project)
            .field("environment", &self.environment)
            .field("timeout", &self.timeout)
            .finish()
    }
}
