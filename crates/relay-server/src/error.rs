//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use relay_core::BillingError;
use relay_runtime::ProxyError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Error returned by every handler, rendered as `{"error": message}`
#[derive(Debug, thiserror::Error)]
#[error("{status}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    
    /// Underlying cause, rendered as a separate `message` field
    pub detail: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), detail: None }
    }
    
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
    
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }
    
    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        let status = match &err {
            BillingError::NotFound(_) => StatusCode::NOT_FOUND,
            BillingError::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        
        if status.is_server_error() {
            tracing::error!(error = %err, "Billing operation failed");
        }
        
        Self::new(status, err.user_message())
    }
}

impl From<ProxyError> for ApiError {
    fn from(err: ProxyError) -> Self {
        tracing::error!(error = %err, "AI proxy error");
        let api = Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.user_message());
        match err.detail() {
            Some(detail) => api.with_detail(detail),
            None => api,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message,
            message: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_billing_status_mapping() {
        let cases = [
            (BillingError::NotFound("x".into()), StatusCode::NOT_FOUND, "Subscription not found"),
            (
                BillingError::Forbidden,
                StatusCode::FORBIDDEN,
                "Not authorized to cancel this subscription",
            ),
            (
                BillingError::Config("stripe".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "Payment service not configured",
            ),
            (
                BillingError::ProviderRequest("card declined".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "card declined",
            ),
        ];
        
        for (err, status, message) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.status, status);
            assert_eq!(api.message, message);
        }
    }

    #[test]
    fn test_proxy_config_mapping() {
        let api = ApiError::from(ProxyError::Config);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, "Service configuration error");
        assert_eq!(api.detail, None);
    }

    #[test]
    fn test_proxy_failure_keeps_cause() {
        let api = ApiError::from(ProxyError::InvalidResponse("expected value at line 1".into()));
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, "Failed to process request");
        assert_eq!(api.detail.as_deref(), Some("expected value at line 1"));
    }
}
