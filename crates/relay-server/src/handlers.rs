//! HTTP Handlers
//!
//! One handler per operation. Auth is enforced by the `AuthenticatedUser`
//! extractor, so every payment handler starts from a verified user ID.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use relay_core::{
    CheckoutCommand, CheckoutStarted, ConfirmOutcome, ProviderKind, SubscriptionId, Tier,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutBody {
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub is_annual: bool,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyBody {
    #[serde(alias = "sessionId", alias = "orderId")]
    pub reference: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBody {
    pub subscription_id: String,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StripeCheckoutResponse {
    pub success: bool,
    pub checkout_url: Option<String>,
    pub subscription_id: SubscriptionId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayPalOrderResponse {
    pub success: bool,
    pub approval_url: Option<String>,
    pub order_id: String,
    pub subscription_id: SubscriptionId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaystackTransactionResponse {
    pub success: bool,
    pub authorization_url: Option<String>,
    pub access_code: Option<String>,
    pub reference: String,
    pub subscription_id: SubscriptionId,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<SubscriptionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl From<ConfirmOutcome> for ConfirmResponse {
    fn from(outcome: ConfirmOutcome) -> Self {
        match outcome {
            ConfirmOutcome::Confirmed { subscription_id } => Self {
                success: true,
                subscription_id,
                error: None,
            },
            ConfirmOutcome::NotCompleted => Self {
                success: false,
                subscription_id: None,
                error: Some("Payment not completed"),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ProviderHealth {
    pub stripe: bool,
    pub paypal: bool,
    pub paystack: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub providers: ProviderHealth,
    pub ai_proxy_configured: bool,
}

// ============================================================================
// Shared Steps
// ============================================================================

/// Redirect origin: the caller's `Origin` header, else the configured app origin
fn return_origin(state: &AppState, headers: &HeaderMap) -> String {
    headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map_or_else(|| state.app_origin.to_string(), ToString::to_string)
}

async fn begin_checkout(
    state: &AppState,
    user_id: String,
    headers: &HeaderMap,
    provider: ProviderKind,
    body: CheckoutBody,
) -> Result<CheckoutStarted, ApiError> {
    let command = CheckoutCommand {
        user_id,
        provider,
        tier: Tier::parse_or_default(body.tier.as_deref()),
        is_annual: body.is_annual,
        email: body.email,
        return_origin: return_origin(state, headers),
    };
    
    Ok(state.lifecycle.begin_checkout(command).await?)
}

async fn confirm(
    state: &AppState,
    provider: ProviderKind,
    body: VerifyBody,
) -> Result<Json<ConfirmResponse>, ApiError> {
    let outcome = state.lifecycle.confirm_payment(provider, &body.reference).await?;
    Ok(Json(outcome.into()))
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let gateways = state.lifecycle.gateways();
    
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        providers: ProviderHealth {
            stripe: gateways.is_configured(ProviderKind::CardNetwork),
            paypal: gateways.is_configured(ProviderKind::Wallet),
            paystack: gateways.is_configured(ProviderKind::Regional),
        },
        ai_proxy_configured: state.proxy.is_configured(),
    })
}

pub async fn create_stripe_checkout(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    headers: HeaderMap,
    Json(body): Json<CheckoutBody>,
) -> Result<Json<StripeCheckoutResponse>, ApiError> {
    let started =
        begin_checkout(&state, identity.user_id, &headers, ProviderKind::CardNetwork, body).await?;
    
    Ok(Json(StripeCheckoutResponse {
        success: true,
        checkout_url: started.checkout.redirect_url,
        subscription_id: started.subscription.id,
    }))
}

pub async fn verify_stripe_payment(
    State(state): State<AppState>,
    AuthenticatedUser(_): AuthenticatedUser,
    Json(body): Json<VerifyBody>,
) -> Result<Json<ConfirmResponse>, ApiError> {
    confirm(&state, ProviderKind::CardNetwork, body).await
}

pub async fn create_paypal_order(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    headers: HeaderMap,
    Json(body): Json<CheckoutBody>,
) -> Result<Json<PayPalOrderResponse>, ApiError> {
    let started =
        begin_checkout(&state, identity.user_id, &headers, ProviderKind::Wallet, body).await?;
    
    Ok(Json(PayPalOrderResponse {
        success: true,
        approval_url: started.checkout.redirect_url,
        order_id: started.checkout.external_ref,
        subscription_id: started.subscription.id,
    }))
}

pub async fn verify_paypal_payment(
    State(state): State<AppState>,
    AuthenticatedUser(_): AuthenticatedUser,
    Json(body): Json<VerifyBody>,
) -> Result<Json<ConfirmResponse>, ApiError> {
    confirm(&state, ProviderKind::Wallet, body).await
}

pub async fn create_paystack_transaction(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    headers: HeaderMap,
    Json(body): Json<CheckoutBody>,
) -> Result<Json<PaystackTransactionResponse>, ApiError> {
    let started =
        begin_checkout(&state, identity.user_id, &headers, ProviderKind::Regional, body).await?;
    
    Ok(Json(PaystackTransactionResponse {
        success: true,
        authorization_url: started.checkout.redirect_url,
        access_code: started.checkout.access_code,
        reference: started.checkout.external_ref,
        subscription_id: started.subscription.id,
    }))
}

pub async fn verify_paystack_payment(
    State(state): State<AppState>,
    AuthenticatedUser(_): AuthenticatedUser,
    Json(body): Json<VerifyBody>,
) -> Result<Json<ConfirmResponse>, ApiError> {
    confirm(&state, ProviderKind::Regional, body).await
}

pub async fn cancel_subscription(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(body): Json<CancelBody>,
) -> Result<Json<CancelResponse>, ApiError> {
    let id = SubscriptionId::from_string(body.subscription_id);
    state.lifecycle.cancel(&identity.user_id, &id).await?;
    
    Ok(Json(CancelResponse {
        success: true,
        message: "Subscription cancelled successfully",
    }))
}

/// AI completion pass-through; upstream status and body are relayed as-is
pub async fn openai_proxy(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.proxy.forward(&body).await?;
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    
    Ok((status, Json(response.body)))
}

/// CORS preflight
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}
