use crate::template::TemplateError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlagonError {
    #[error("{0}")]
    Usage(String),

    #[error("unsupported backend: {0}")]
    UnsupportedBackend(String),

    #[error("Backend configuration error: {0}")]
    BackendConfig(String),

    #[error("Request to '{url}' failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success response from a provider API
    #[error("Provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Flag not found: {0}")]
    FlagNotFound(String),

    #[error("Flag '{0}' is off")]
    FlagDisabled(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Operation cancelled by user")]
    Cancelled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// Failure the command already communicated (or chose to suppress).
    /// The executor exits non-zero without printing it again.
    #[error("{0}")]
    Silent(Box<FlagonError>),
}

impl FlagonError {
    /// Tag this error as silent.
    pub fn silent(self) -> Self {
        match self {
            FlagonError::Silent(_) => self,
            other => FlagonError::Silent(Box::new(other)),
        }
    }

    pub fn is_silent(&self) -> bool {
        matches!(self, FlagonError::Silent(_))
    }
}

pub type Result<T> = std::result::Result<T, FlagonError>;
