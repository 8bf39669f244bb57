//! PayPal Orders
//!
//! Wallet provider. Every call is preceded by a client-credentials token
//! exchange (Basic auth) and then made with the short-lived bearer token.
//! The subscription ID is sent as the purchase unit's `custom_id`.

use async_trait::async_trait;
use relay_core::pricing::to_major_units;
use relay_core::{
    BillingError, CheckoutRequest, PaymentConfirmation, PaymentGateway, ProviderCheckout,
    ProviderKind, Result,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{missing_credentials, provider_message, transport};
use crate::http::{decode, endpoint, read_json};

const PROVIDER: &str = "PayPal";

/// PayPal API credentials
#[derive(Clone, Debug)]
pub struct PayPalConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Live or sandbox API host
    pub api_base: String,
}

impl PayPalConfig {
    pub const DEFAULT_API_BASE: &'static str = "https://api-m.paypal.com";
    
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_base: Self::DEFAULT_API_BASE.into(),
        }
    }
    
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
    
    /// `None` unless both the client ID and secret are set
    pub fn from_env() -> Option<Self> {
        let client_id = std::env::var("PAYPAL_CLIENT_ID").ok().filter(|v| !v.is_empty())?;
        let client_secret = std::env::var("PAYPAL_CLIENT_SECRET").ok().filter(|v| !v.is_empty())?;
        let config = Self::new(client_id, client_secret);
        
        Some(match std::env::var("PAYPAL_API_BASE") {
            Ok(base) if !base.is_empty() => config.with_api_base(base),
            _ => config,
        })
    }
}

/// `POST /v1/oauth2/token` reply
#[derive(Debug, Deserialize)]
struct TokenReply {
    access_token: Option<String>,
}

/// Order as returned by order creation and capture
#[derive(Debug, Default, Deserialize)]
struct Order {
    id: Option<String>,
    status: Option<String>,
    #[serde(default)]
    links: Vec<OrderLink>,
    #[serde(default)]
    purchase_units: Vec<PurchaseUnit>,
}

#[derive(Debug, Deserialize)]
struct OrderLink {
    #[serde(default)]
    rel: String,
    #[serde(default)]
    href: String,
}

#[derive(Debug, Deserialize)]
struct PurchaseUnit {
    custom_id: Option<String>,
    payments: Option<UnitPayments>,
}

#[derive(Debug, Deserialize)]
struct UnitPayments {
    #[serde(default)]
    captures: Vec<Capture>,
}

#[derive(Debug, Deserialize)]
struct Capture {
    custom_id: Option<String>,
}

impl Order {
    /// The `approve` HATEOAS link
    fn approval_link(&self) -> Option<String> {
        self.links
            .iter()
            .find(|link| link.rel == "approve")
            .map(|link| link.href.clone())
    }
    
    /// `custom_id` of the first purchase unit, or of its first capture
    fn custom_id(&self) -> Option<String> {
        let unit = self.purchase_units.first()?;
        unit.custom_id.clone().or_else(|| {
            unit.payments
                .as_ref()?
                .captures
                .first()?
                .custom_id
                .clone()
        })
    }
}

/// PayPal checkout gateway
pub struct PayPalGateway {
    http: reqwest::Client,
    config: Option<PayPalConfig>,
}

impl PayPalGateway {
    pub fn new(http: reqwest::Client, config: PayPalConfig) -> Self {
        Self { http, config: Some(config) }
    }
    
    pub const fn unconfigured(http: reqwest::Client) -> Self {
        Self { http, config: None }
    }
    
    pub fn from_env(http: reqwest::Client) -> Self {
        Self { http, config: PayPalConfig::from_env() }
    }
    
    fn config(&self) -> Result<&PayPalConfig> {
        self.config
            .as_ref()
            .ok_or_else(|| missing_credentials("PAYPAL_CLIENT_ID/PAYPAL_CLIENT_SECRET"))
    }
    
    /// Exchange client credentials for a bearer token
    async fn access_token(&self, config: &PayPalConfig) -> Result<String> {
        let url = endpoint(&config.api_base, &["v1", "oauth2", "token"])?;
        
        let response = self
            .http
            .post(url)
            .basic_auth(&config.client_id, Some(&config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| transport(PROVIDER, &e))?;
        
        let (status, body) = read_json(PROVIDER, response).await?;
        let reply: TokenReply = decode(PROVIDER, &body)?;
        
        reply
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                tracing::warn!(status, "PayPal token exchange returned no access token");
                BillingError::ProviderAuth("Failed to authenticate with PayPal".into())
            })
    }
}

/// Order creation body
fn order_body(request: &CheckoutRequest) -> Value {
    json!({
        "intent": "CAPTURE",
        "purchase_units": [{
            "amount": {
                "currency_code": "USD",
                "value": to_major_units(request.amount),
            },
            "description": format!("{} Subscription", request.tier.plan_name()),
            "custom_id": request.subscription_id.as_str(),
        }],
        "application_context": {
            "return_url": format!("{}?subscription_id={}", request.success_url(), request.subscription_id),
            "cancel_url": request.cancel_url(),
        },
    })
}

#[async_trait]
impl PaymentGateway for PayPalGateway {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Wallet
    }
    
    fn is_configured(&self) -> bool {
        self.config.is_some()
    }
    
    async fn begin_checkout(&self, request: &CheckoutRequest) -> Result<ProviderCheckout> {
        let config = self.config()?;
        let token = self.access_token(config).await?;
        
        let response = self
            .http
            .post(endpoint(&config.api_base, &["v2", "checkout", "orders"])?)
            .bearer_auth(token)
            .json(&order_body(request))
            .send()
            .await
            .map_err(|e| transport(PROVIDER, &e))?;
        
        let (status, body) = read_json(PROVIDER, response).await?;
        let rejected = !(200..300).contains(&status) || body.get("error").is_some();
        let order: Order = if rejected { Order::default() } else { decode(PROVIDER, &body)? };
        
        let Some(order_id) = order.id.clone() else {
            return Err(BillingError::ProviderRequest(
                provider_message(&body).unwrap_or_else(|| "PayPal order creation failed".into()),
            ));
        };
        
        tracing::debug!(order_id, "PayPal order created");
        
        Ok(ProviderCheckout {
            redirect_url: order.approval_link(),
            external_ref: order_id,
            access_code: None,
        })
    }
    
    async fn confirm_payment(&self, reference: &str) -> Result<PaymentConfirmation> {
        let config = self.config()?;
        let token = self.access_token(config).await?;
        
        let url = endpoint(
            &config.api_base,
            &["v2", "checkout", "orders", reference, "capture"],
        )?;
        
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| transport(PROVIDER, &e))?;
        
        let (status, body) = read_json(PROVIDER, response).await?;
        let capture: Order = decode(PROVIDER, &body)?;
        
        if capture.status.as_deref() != Some("COMPLETED") {
            tracing::info!(status, reference, "PayPal capture not completed");
            return Ok(PaymentConfirmation::unpaid());
        }
        
        Ok(PaymentConfirmation::paid(capture.custom_id()))
    }
}
