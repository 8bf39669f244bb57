//! Application State

use std::sync::Arc;

use relay_core::{IdentityVerifier, SubscriptionLifecycle};
use relay_runtime::OpenAiProxy;

use crate::config::CorsConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Subscription lifecycle over the configured gateways
    pub lifecycle: Arc<SubscriptionLifecycle>,
    
    /// Bearer token verifier
    pub verifier: Arc<dyn IdentityVerifier>,
    
    /// AI completion proxy
    pub proxy: Arc<OpenAiProxy>,
    
    pub cors: Arc<CorsConfig>,
    
    /// Redirect origin used when a request has no `Origin` header
    pub app_origin: Arc<str>,
}
