//! Provider Error Mapping
//!
//! Provider adapters report through the core `BillingError`; these helpers
//! keep the wording consistent across providers.

use relay_core::BillingError;
use serde_json::Value;

/// Credential absent from the environment
pub(crate) fn missing_credentials(names: &str) -> BillingError {
    BillingError::ProviderAuth(format!("{names} not configured"))
}

/// Network or protocol failure talking to a provider
pub(crate) fn transport(provider: &str, err: &reqwest::Error) -> BillingError {
    BillingError::Unexpected(format!("{provider} request failed: {err}"))
}

/// Pull a human-readable message out of a provider error payload.
///
/// Understands `{"error": {"message": ..}}`, `{"error": ".."}` with an
/// optional `error_description`, and a top-level `{"message": ..}`.
pub(crate) fn provider_message(body: &Value) -> Option<String> {
    let from_error = match body.get("error") {
        Some(Value::Object(err)) => err.get("message").and_then(Value::as_str),
        Some(Value::String(code)) => body
            .get("error_description")
            .and_then(Value::as_str)
            .or(Some(code.as_str())),
        _ => None,
    };
    
    from_error
        .or_else(|| body.get("message").and_then(Value::as_str))
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_error_message() {
        let body = json!({"error": {"message": "No such price"}});
        assert_eq!(provider_message(&body).as_deref(), Some("No such price"));
    }

    #[test]
    fn test_oauth_error_description() {
        let body = json!({"error": "invalid_client", "error_description": "Client Authentication failed"});
        assert_eq!(provider_message(&body).as_deref(), Some("Client Authentication failed"));
    }

    #[test]
    fn test_top_level_message() {
        let body = json!({"status": false, "message": "Invalid key"});
        assert_eq!(provider_message(&body).as_deref(), Some("Invalid key"));
        assert_eq!(provider_message(&json!({"status": true})), None);
    }
}
