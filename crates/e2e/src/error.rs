//! Error types for the API harness

use thiserror::Error;

use crate::context::Fact;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Request failed: {method} {url} - {reason}")]
    Request {
        method: String,
        url: String,
        reason: String,
    },

    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("Step '{step}' is missing prerequisite: {fact}")]
    MissingPrerequisite { step: String, fact: Fact },

    #[error("Invalid pipeline: {0}")]
    Pipeline(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl HarnessError {
    /// Build an assertion failure from anything displayable
    pub fn assertion(message: impl Into<String>) -> Self {
        HarnessError::Assertion(message.into())
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;
