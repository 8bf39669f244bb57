//! Shared HTTP plumbing for the JSON providers

use relay_core::{BillingError, Result};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::transport;

/// Join path segments onto a base URL, percent-encoding each segment so a
/// caller-supplied reference cannot escape its path position.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| BillingError::Config(format!("invalid provider base URL {base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| BillingError::Config(format!("provider base URL {base} cannot take a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Read a provider response as JSON, keeping the HTTP status
pub(crate) async fn read_json(provider: &str, response: Response) -> Result<(u16, Value)> {
    let status = response.status().as_u16();
    let body = response
        .json::<Value>()
        .await
        .map_err(|e| transport(provider, &e))?;
    Ok((status, body))
}

/// Decode a provider reply into its typed shape
pub(crate) fn decode<T: DeserializeOwned>(provider: &str, body: &Value) -> Result<T> {
    serde_json::from_value(body.clone())
        .map_err(|e| BillingError::Unexpected(format!("{provider} returned an unexpected reply: {e}")))
}
