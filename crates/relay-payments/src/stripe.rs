//! Stripe Checkout (Hosted)
//!
//! Card-network provider. Opens a one-off payment Checkout Session and later
//! retrieves it to see whether it was paid. The subscription ID rides along
//! in the session metadata.

use std::collections::HashMap;

use async_trait::async_trait;
use relay_core::{
    BillingError, CheckoutRequest, PaymentConfirmation, PaymentGateway, ProviderCheckout,
    ProviderKind, Result,
};
use stripe::{
    CheckoutSession, CheckoutSessionId, CheckoutSessionMode, CheckoutSessionPaymentStatus,
    Client, CreateCheckoutSession, CreateCheckoutSessionLineItems,
    CreateCheckoutSessionLineItemsPriceData, CreateCheckoutSessionLineItemsPriceDataProductData,
    CreateCheckoutSessionPaymentMethodTypes, Currency, StripeError,
};

use crate::error::missing_credentials;

const SECRET_KEY_VAR: &str = "STRIPE_SECRET_KEY";

/// Stripe checkout gateway
pub struct StripeGateway {
    client: Option<Client>,
}

impl StripeGateway {
    /// Create a gateway with a secret API key
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: Some(Client::new(secret_key)),
        }
    }
    
    /// Create a gateway against a non-default API host
    pub fn with_api_base(secret_key: &str, api_base: &str) -> Result<Self> {
        let base = reqwest::Url::parse(api_base)
            .map_err(|e| BillingError::Config(format!("invalid Stripe base URL {api_base}: {e}")))?;
        
        Ok(Self {
            client: Some(Client::from_url(base.as_str(), secret_key)),
        })
    }
    
    /// A gateway with no credentials; every call fails with `ProviderAuth`
    pub const fn unconfigured() -> Self {
        Self { client: None }
    }
    
    /// Create from environment variables
    pub fn from_env() -> Self {
        let Some(key) = std::env::var(SECRET_KEY_VAR).ok().filter(|k| !k.is_empty()) else {
            return Self::unconfigured();
        };
        
        match std::env::var("STRIPE_API_BASE") {
            Ok(base) if !base.is_empty() => Self::with_api_base(&key, &base).unwrap_or_else(|e| {
                tracing::error!(error = %e, "Ignoring STRIPE_API_BASE");
                Self::new(&key)
            }),
            _ => Self::new(&key),
        }
    }
    
    fn client(&self) -> Result<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| missing_credentials(SECRET_KEY_VAR))
    }
}

/// Return URL carrying both the Stripe session ID placeholder and our ID
fn success_url(request: &CheckoutRequest) -> String {
    format!(
        "{}?session_id={{CHECKOUT_SESSION_ID}}&subscription_id={}",
        request.success_url(),
        request.subscription_id
    )
}

fn session_metadata(request: &CheckoutRequest) -> HashMap<String, String> {
    HashMap::from([
        ("subscription_id".to_string(), request.subscription_id.to_string()),
        ("user_id".to_string(), request.user_id.clone()),
        ("tier".to_string(), request.tier.as_str().to_string()),
    ])
}

/// Build Checkout Session parameters
fn session_params<'a>(
    request: &'a CheckoutRequest,
    success_url: &'a str,
    cancel_url: &'a str,
) -> CreateCheckoutSession<'a> {
    let mut params = CreateCheckoutSession::new();
    params.mode = Some(CheckoutSessionMode::Payment);
    params.payment_method_types = Some(vec![CreateCheckoutSessionPaymentMethodTypes::Card]);
    params.success_url = Some(success_url);
    params.cancel_url = Some(cancel_url);
    params.customer_email = request.email.as_deref();
    params.metadata = Some(session_metadata(request));
    
    params.line_items = Some(vec![CreateCheckoutSessionLineItems {
        quantity: Some(1),
        price_data: Some(CreateCheckoutSessionLineItemsPriceData {
            currency: Currency::USD,
            unit_amount: Some(request.amount),
            product_data: Some(CreateCheckoutSessionLineItemsPriceDataProductData {
                name: request.tier.plan_name(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }]);
    
    params
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    fn kind(&self) -> ProviderKind {
        ProviderKind::CardNetwork
    }
    
    fn is_configured(&self) -> bool {
        self.client.is_some()
    }
    
    async fn begin_checkout(&self, request: &CheckoutRequest) -> Result<ProviderCheckout> {
        let client = self.client()?;
        
        let success_url = success_url(request);
        let cancel_url = request.cancel_url();
        let params = session_params(request, &success_url, &cancel_url);
        
        let session = CheckoutSession::create(client, params)
            .await
            .map_err(|e| BillingError::ProviderRequest(e.to_string()))?;
        
        tracing::debug!(session_id = %session.id, "Stripe checkout session created");
        
        Ok(ProviderCheckout {
            external_ref: session.id.to_string(),
            redirect_url: session.url,
            access_code: None,
        })
    }
    
    async fn confirm_payment(&self, reference: &str) -> Result<PaymentConfirmation> {
        let client = self.client()?;
        
        let Ok(session_id) = reference.parse::<CheckoutSessionId>() else {
            tracing::warn!(reference, "Not a Stripe checkout session ID");
            return Ok(PaymentConfirmation::unpaid());
        };
        
        let session = match CheckoutSession::retrieve(client, &session_id, &[]).await {
            Ok(session) => session,
            // Stripe rejected the lookup (unknown or expired session): not paid
            Err(StripeError::Stripe(err)) => {
                tracing::warn!(reference, error = %err, "Stripe session lookup rejected");
                return Ok(PaymentConfirmation::unpaid());
            }
            Err(e) => return Err(BillingError::Unexpected(e.to_string())),
        };
        
        if session.payment_status != CheckoutSessionPaymentStatus::Paid {
            return Ok(PaymentConfirmation::unpaid());
        }
        
        let correlation_id = session
            .metadata
            .as_ref()
            .and_then(|m| m.get("subscription_id"))
            .cloned();
        
        Ok(PaymentConfirmation::paid(correlation_id))
    }
}
