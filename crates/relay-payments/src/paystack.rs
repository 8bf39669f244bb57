//! Paystack Transactions
//!
//! Regional processor. Transactions are initialized with our subscription
//! ID as the Paystack `reference`, so a verify call can always fall back to
//! the reference when the metadata echo is missing.

use async_trait::async_trait;
use relay_core::{
    BillingError, CheckoutRequest, PaymentConfirmation, PaymentGateway, ProviderCheckout,
    ProviderKind, Result,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{missing_credentials, provider_message, transport};
use crate::http::{decode, endpoint, read_json};

const PROVIDER: &str = "Paystack";
const SECRET_KEY_VAR: &str = "PAYSTACK_SECRET_KEY";

/// Paystack API credentials
#[derive(Clone, Debug)]
pub struct PaystackConfig {
    pub secret_key: String,
    pub api_base: String,
}

impl PaystackConfig {
    pub const DEFAULT_API_BASE: &'static str = "https://api.paystack.co";
    
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            api_base: Self::DEFAULT_API_BASE.into(),
        }
    }
    
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
    
    pub fn from_env() -> Option<Self> {
        let secret_key = std::env::var(SECRET_KEY_VAR).ok().filter(|v| !v.is_empty())?;
        let config = Self::new(secret_key);
        
        Some(match std::env::var("PAYSTACK_API_BASE") {
            Ok(base) if !base.is_empty() => config.with_api_base(base),
            _ => config,
        })
    }
}

/// Paystack checkout gateway
pub struct PaystackGateway {
    http: reqwest::Client,
    config: Option<PaystackConfig>,
}

impl PaystackGateway {
    pub fn new(http: reqwest::Client, config: PaystackConfig) -> Self {
        Self { http, config: Some(config) }
    }
    
    pub const fn unconfigured(http: reqwest::Client) -> Self {
        Self { http, config: None }
    }
    
    pub fn from_env(http: reqwest::Client) -> Self {
        Self { http, config: PaystackConfig::from_env() }
    }
    
    fn config(&self) -> Result<&PaystackConfig> {
        self.config
            .as_ref()
            .ok_or_else(|| missing_credentials(SECRET_KEY_VAR))
    }
}

/// Transaction initialization body
fn initialize_body(request: &CheckoutRequest) -> Value {
    json!({
        "email": request.email,
        "amount": request.amount,
        "currency": "USD",
        "reference": request.subscription_id.as_str(),
        "callback_url": request.success_url(),
        "metadata": {
            "subscription_id": request.subscription_id.as_str(),
            "user_id": request.user_id,
            "tier": request.tier.as_str(),
        },
    })
}

/// Every Paystack reply wraps its payload the same way
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    status: bool,
    data: Option<T>,
}

/// `POST /transaction/initialize` payload
#[derive(Debug, Deserialize)]
struct Initialized {
    reference: Option<String>,
    authorization_url: Option<String>,
    access_code: Option<String>,
}

/// `GET /transaction/verify/{reference}` payload
#[derive(Debug, Deserialize)]
struct Verified {
    status: Option<String>,
    metadata: Option<Metadata>,
}

/// Paystack echoes metadata back as an object, or as `""` when none was sent
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Metadata {
    Fields { subscription_id: Option<String> },
    Other(Value),
}

impl Verified {
    fn subscription_id(self) -> Option<String> {
        match self.metadata? {
            Metadata::Fields { subscription_id } => subscription_id,
            Metadata::Other(_) => None,
        }
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Regional
    }
    
    fn is_configured(&self) -> bool {
        self.config.is_some()
    }
    
    fn reference_is_subscription_id(&self) -> bool {
        true
    }
    
    async fn begin_checkout(&self, request: &CheckoutRequest) -> Result<ProviderCheckout> {
        let config = self.config()?;
        
        let response = self
            .http
            .post(endpoint(&config.api_base, &["transaction", "initialize"])?)
            .bearer_auth(&config.secret_key)
            .json(&initialize_body(request))
            .send()
            .await
            .map_err(|e| transport(PROVIDER, &e))?;
        
        let (_, body) = read_json(PROVIDER, response).await?;
        let reply: Envelope<Initialized> = decode(PROVIDER, &body)?;
        
        let initialized = reply.data.filter(|_| reply.status);
        
        let Some(Initialized { reference: Some(reference), authorization_url, access_code }) = initialized
        else {
            return Err(BillingError::ProviderRequest(
                provider_message(&body).unwrap_or_else(|| "Paystack initialization failed".into()),
            ));
        };
        
        tracing::debug!(reference, "Paystack transaction initialized");
        
        Ok(ProviderCheckout {
            external_ref: reference,
            redirect_url: authorization_url,
            access_code,
        })
    }
    
    async fn confirm_payment(&self, reference: &str) -> Result<PaymentConfirmation> {
        let config = self.config()?;
        
        let response = self
            .http
            .get(endpoint(&config.api_base, &["transaction", "verify", reference])?)
            .bearer_auth(&config.secret_key)
            .send()
            .await
            .map_err(|e| transport(PROVIDER, &e))?;
        
        let (status, body) = read_json(PROVIDER, response).await?;
        let reply: Envelope<Verified> = decode(PROVIDER, &body)?;
        
        let verified = reply
            .data
            .filter(|data| reply.status && data.status.as_deref() == Some("success"));
        
        let Some(verified) = verified else {
            tracing::info!(status, reference, "Paystack transaction not successful");
            return Ok(PaymentConfirmation::unpaid());
        };
        
        Ok(PaymentConfirmation::paid(verified.subscription_id()))
    }
}
