//! Error Types

use thiserror::Error;

/// Result type alias for billing operations
pub type Result<T> = std::result::Result<T, BillingError>;

/// Billing and subscription lifecycle errors
#[derive(Error, Debug)]
pub enum BillingError {
    /// Provider rejected the request; carries the provider's own message
    #[error("{0}")]
    ProviderRequest(String),
    
    /// Provider credentials missing or the credential exchange failed
    #[error("{0}")]
    ProviderAuth(String),
    
    /// Required configuration is absent
    #[error("Configuration error: {0}")]
    Config(String),
    
    /// No subscription with this ID
    #[error("Subscription not found: {0}")]
    NotFound(String),
    
    /// Caller does not own the subscription
    #[error("Not authorized to cancel this subscription")]
    Forbidden,
    
    /// A record mutation the state machine does not allow
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    
    /// Anything else; the message is surfaced to the caller
    #[error("{0}")]
    Unexpected(String),
}

impl BillingError {
    /// Whether the failure stems from server configuration rather than the request
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_))
    }
    
    /// Get user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(_) => "Payment service not configured".into(),
            Self::NotFound(_) => "Subscription not found".into(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for BillingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Unexpected(err.to_string())
    }
}
