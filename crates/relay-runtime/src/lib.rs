//! # relay-runtime
//!
//! AI completion proxy for tier-relay.
//!
//! Forwards arbitrary JSON to an OpenAI-compatible upstream and relays the
//! answer unchanged. Path selection:
//!
//! - explicit `endpoint` field
//! - `/responses` when the body or its `payload` carries `input`
//! - `/chat/completions` otherwise
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relay_runtime::OpenAiProxy;
//!
//! let proxy = OpenAiProxy::from_env(reqwest::Client::new());
//! let response = proxy.forward(&body).await?;
//! ```

pub mod error;
pub mod openai;

pub use error::{ProxyError, Result};
pub use openai::{route, OpenAiConfig, OpenAiProxy, ProxyResponse, ProxyRoute};
