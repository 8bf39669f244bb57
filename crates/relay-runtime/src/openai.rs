//! OpenAI-compatible pass-through
//!
//! The proxy never interprets the completion request. It only decides which
//! upstream path to hit and which part of the caller's body to forward.

use serde_json::Value;

use crate::error::{ProxyError, Result};

const RESPONSES_PATH: &str = "/responses";
const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Upstream configuration
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// Bearer credential
    pub api_key: String,
    
    /// Base URL, paths are appended verbatim
    pub api_base: String,
}

impl OpenAiConfig {
    pub const DEFAULT_API_BASE: &'static str = "https://api.openai.com/v1";
    
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: Self::DEFAULT_API_BASE.into(),
        }
    }
    
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
    
    /// Reads `OPENAI_API_KEY` and `OPENAI_API_BASE`.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty())?;
        let config = Self::new(api_key);
        
        Some(match std::env::var("OPENAI_API_BASE") {
            Ok(base) if !base.is_empty() => config.with_api_base(base),
            _ => config,
        })
    }
}

/// Resolved upstream call
#[derive(Debug, PartialEq)]
pub struct ProxyRoute<'a> {
    pub path: String,
    pub body: &'a Value,
}

/// Upstream answer, relayed unchanged
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyResponse {
    pub status: u16,
    pub body: Value,
}

fn nested_payload(body: &Value) -> Option<&Value> {
    body.get("payload").filter(|p| !p.is_null())
}

fn has_input(value: &Value) -> bool {
    value.as_object().is_some_and(|o| o.contains_key("input"))
}

/// Decide upstream path and forwarded body.
///
/// An explicit `endpoint` string wins. Otherwise `input` in the body or its
/// nested `payload` selects the Responses API, anything else goes to
/// Chat Completions.
pub fn route(body: &Value) -> ProxyRoute<'_> {
    let payload = nested_payload(body);
    
    let path = match body.get("endpoint").and_then(Value::as_str) {
        Some(endpoint) if !endpoint.is_empty() => {
            if endpoint.starts_with('/') {
                endpoint.to_string()
            } else {
                format!("/{endpoint}")
            }
        }
        _ if has_input(body) || payload.is_some_and(has_input) => RESPONSES_PATH.into(),
        _ => CHAT_COMPLETIONS_PATH.into(),
    };
    
    ProxyRoute {
        path,
        body: payload.unwrap_or(body),
    }
}

/// AI completion proxy
pub struct OpenAiProxy {
    http: reqwest::Client,
    config: Option<OpenAiConfig>,
}

impl OpenAiProxy {
    pub fn new(http: reqwest::Client, config: OpenAiConfig) -> Self {
        Self { http, config: Some(config) }
    }
    
    pub const fn unconfigured(http: reqwest::Client) -> Self {
        Self { http, config: None }
    }
    
    pub fn from_env(http: reqwest::Client) -> Self {
        Self { http, config: OpenAiConfig::from_env() }
    }
    
    pub const fn is_configured(&self) -> bool {
        self.config.is_some()
    }
    
    /// Forward a request upstream and relay status and body verbatim,
    /// upstream errors included.
    pub async fn forward(&self, body: &Value) -> Result<ProxyResponse> {
        let config = self.config.as_ref().ok_or_else(|| {
            tracing::error!("OPENAI_API_KEY not configured");
            ProxyError::Config
        })?;
        
        let route = route(body);
        let url = format!("{}{}", config.api_base.trim_end_matches('/'), route.path);
        
        tracing::debug!(path = %route.path, "Forwarding completion request");
        
        let response = self
            .http
            .post(url.as_str())
            .bearer_auth(&config.api_key)
            .json(route.body)
            .send()
            .await?;
        
        let status = response.status().as_u16();
        let body = response.json::<Value>().await?;
        
        if status >= 400 {
            tracing::warn!(status, path = %route.path, "Upstream returned an error");
        }
        
        Ok(ProxyResponse { status, body })
    }
}
