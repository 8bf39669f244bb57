//! Proxy error types

use thiserror::Error;

/// AI proxy errors
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Upstream credential absent
    #[error("Service configuration error")]
    Config,

    /// Upstream unreachable or the request could not be built
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    /// Upstream answered with a body that is not JSON
    #[error("Upstream returned an invalid response: {0}")]
    InvalidResponse(String),
}

impl ProxyError {
    /// Message safe to return to the caller
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Config => "Service configuration error",
            Self::Upstream(_) | Self::InvalidResponse(_) => "Failed to process request",
        }
    }
    
    /// Underlying cause, for errors that have one
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Config => None,
            Self::Upstream(detail) | Self::InvalidResponse(detail) => Some(detail),
        }
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Upstream(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
