//! LaunchDarkly REST API backend.
//!
//! Every request is scoped to one project and one environment. The client is
//! blocking; each call is bounded by the configured timeout or by the
//! context deadline, whichever comes first.

pub mod config;

pub use config::{ConnectionSettings, LaunchDarklyConfig};

use super::{Backend, Flag, validate_flag_key};
use crate::context::Context;
use crate::error::{FlagonError, Result};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

pub const BACKEND_NAME: &str = "launchdarkly";

const SEMANTIC_PATCH: &str = "application/json; domain-model=launchdarkly.semanticpatch";

pub struct LaunchDarklyBackend {
    client: Client,
    settings: ConnectionSettings,
}

impl LaunchDarklyBackend {
    /// Validate `config`, build the HTTP client and check that the project
    /// and environment exist and the token can read them.
    pub fn connect(ctx: &Context, config: LaunchDarklyConfig) -> Result<Self> {
        let settings = config.validate()?;
        let backend = Self::with_settings(settings)?;
        backend.check_environment(ctx)?;
        Ok(backend)
    }

    /// Build a client without contacting the service.
    pub fn with_settings(settings: ConnectionSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("flagon/{}", env!("CARGO_PKG_VERSION")))
            .timeout(settings.timeout)
            .build()
            .map_err(|e| FlagonError::BackendConfig(format!("HTTP client: {}", e)))?;

        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    fn check_environment(&self, ctx: &Context) -> Result<()> {
        let url = format!(
            "{}/api/v2/projects/{}/environments/{}",
            self.settings.base_url, self.settings.project, self.settings.environment
        );
        let resp = self.send(ctx, &url, self.client.get(&url))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(FlagonError::BackendConfig(format!(
                "LaunchDarkly environment '{}' not found in project '{}'",
                self.settings.environment, self.settings.project
            )));
        }
        check_status(resp).map(|_| ())
    }

    fn flag_url(&self, key: &str) -> String {
        format!(
            "{}/api/v2/flags/{}/{}",
            self.settings.base_url, self.settings.project, key
        )
    }

    fn send(&self, ctx: &Context, url: &str, request: RequestBuilder) -> Result<Response> {
        ctx.check()?;

        let mut request = request.header("Authorization", &self.settings.access_token);
        if let Some(remaining) = ctx.remaining() {
            request = request.timeout(remaining.min(self.settings.timeout));
        }

        tracing::debug!(url, "LaunchDarkly request");
        request.send().map_err(|source| {
            // A deadline or cancellation that fired mid-request wins over
            // the transport error it caused.
            match ctx.check() {
                Err(err) => err,
                Ok(()) => FlagonError::Http {
                    url: url.to_string(),
                    source,
                },
            }
        })
    }

    fn read_flag(&self, ctx: &Context, key: &str, request: RequestBuilder) -> Result<Flag> {
        let url = self.flag_url(key);
        let resp = self.send(ctx, &url, request)?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(FlagonError::FlagNotFound(key.to_string()));
        }
        let flag: ApiFlag = read_json(check_status(resp)?)?;
        Ok(flag.into_flag(&self.settings.environment))
    }
}

impl Backend for LaunchDarklyBackend {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    fn list_flags(&self, ctx: &Context) -> Result<Vec<Flag>> {
        let url = format!(
            "{}/api/v2/flags/{}",
            self.settings.base_url, self.settings.project
        );
        let request = self
            .client
            .get(&url)
            .query(&[("env", self.settings.environment.as_str())]);
        let resp = check_status(self.send(ctx, &url, request)?)?;
        let page: ApiFlagPage = read_json(resp)?;

        Ok(page
            .items
            .into_iter()
            .map(|f| f.into_flag(&self.settings.environment))
            .collect())
    }

    fn get_flag(&self, ctx: &Context, key: &str) -> Result<Flag> {
        validate_flag_key(key)?;
        let request = self
            .client
            .get(self.flag_url(key))
            .query(&[("env", self.settings.environment.as_str())]);
        self.read_flag(ctx, key, request)
    }

    fn set_enabled(
        &self,
        ctx: &Context,
        key: &str,
        enabled: bool,
        comment: Option<&str>,
    ) -> Result<Flag> {
        validate_flag_key(key)?;

        let kind = if enabled { "turnFlagOn" } else { "turnFlagOff" };
        let mut body = json!({
            "environmentKey": self.settings.environment,
            "instructions": [{ "kind": kind }],
        });
        if let Some(comment) = comment.filter(|c| !c.is_empty()) {
            body["comment"] = json!(comment);
        }

        let request = self
            .client
            .patch(self.flag_url(key))
            .header("Content-Type", SEMANTIC_PATCH)
            .body(body.to_string());
        self.read_flag(ctx, key, request)
    }
}

fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                trimmed.to_string()
            }
        });

    Err(FlagonError::Api {
        status: status.as_u16(),
        message,
    })
}

fn read_json<T: for<'de> Deserialize<'de>>(resp: Response) -> Result<T> {
    let url = resp.url().to_string();
    let text = resp
        .text()
        .map_err(|source| FlagonError::Http { url, source })?;
    Ok(serde_json::from_str(&text)?)
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiFlagPage {
    #[serde(default)]
    items: Vec<ApiFlag>,
}

#[derive(Debug, Deserialize)]
struct ApiFlag {
    key: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    kind: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    environments: HashMap<String, ApiFlagEnvironment>,
}

#[derive(Debug, Deserialize)]
struct ApiFlagEnvironment {
    #[serde(default)]
    on: bool,
}

impl ApiFlag {
    fn into_flag(self, environment: &str) -> Flag {
        let enabled = self
            .environments
            .get(environment)
            .map(|e| e.on)
            .unwrap_or(false);

        Flag {
            name: if self.name.is_empty() {
                self.key.clone()
            } else {
                self.name
            },
            key: self.key,
            description: self.description,
            kind: self.kind,
            tags: self.tags,
            archived: self.archived,
            enabled,
        }
    }
}
