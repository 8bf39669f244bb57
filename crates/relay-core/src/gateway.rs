//! Payment Gateway Strategy
//!
//! One capability, three implementations. Every provider exposes the same
//! two operations; they differ only in authentication, request encoding and
//! where the subscription ID is echoed back.
//!
//! ```text
//!  SubscriptionLifecycle ──▶ GatewayRegistry[ProviderKind] ──▶ dyn PaymentGateway
//!                                                                ├─ Stripe
//!                                                                ├─ PayPal
//!                                                                └─ Paystack
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{BillingError, Result};
use crate::pricing::Tier;
use crate::subscription::{ProviderKind, SubscriptionId};

/// What a provider needs to open a checkout
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutRequest {
    /// Internal ID, echoed back by the provider as correlation metadata
    pub subscription_id: SubscriptionId,
    
    pub user_id: String,
    
    pub tier: Tier,
    
    pub is_annual: bool,
    
    /// Resolved price in minor units
    pub amount: i64,
    
    /// Customer contact email
    pub email: Option<String>,
    
    /// Origin the customer returns to after checkout
    pub return_origin: String,
}

impl CheckoutRequest {
    /// Where the provider sends the customer after a successful payment
    pub fn success_url(&self) -> String {
        format!("{}/payment-success", self.return_origin)
    }
    
    /// Where the provider sends the customer on abandon
    pub fn cancel_url(&self) -> String {
        format!("{}/pricing", self.return_origin)
    }
}

/// A provider-side checkout session/order/transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderCheckout {
    /// Provider reference, later passed back to `confirm_payment`
    pub external_ref: String,
    
    /// URL to send the customer to
    pub redirect_url: Option<String>,
    
    /// Inline-checkout access code (Paystack)
    pub access_code: Option<String>,
}

/// Result of asking a provider whether a checkout was paid
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentConfirmation {
    pub paid: bool,
    
    /// Subscription ID the provider echoed back, if any
    pub correlation_id: Option<String>,
}

impl PaymentConfirmation {
    pub const fn paid(correlation_id: Option<String>) -> Self {
        Self { paid: true, correlation_id }
    }
    
    pub const fn unpaid() -> Self {
        Self { paid: false, correlation_id: None }
    }
}

/// Strategy trait for payment providers
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Which provider this is
    fn kind(&self) -> ProviderKind;
    
    /// Whether credentials are present
    fn is_configured(&self) -> bool;
    
    /// Whether the provider reference doubles as the subscription ID, so it
    /// may stand in for a missing correlation echo.
    fn reference_is_subscription_id(&self) -> bool {
        false
    }
    
    /// Open a provider checkout for the given subscription
    async fn begin_checkout(&self, request: &CheckoutRequest) -> Result<ProviderCheckout>;
    
    /// Verify (or capture) the payment behind a provider reference.
    ///
    /// An unpaid checkout is `Ok` with `paid == false`, never an error.
    async fn confirm_payment(&self, reference: &str) -> Result<PaymentConfirmation>;
}

/// Gateways keyed by provider
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    gateways: HashMap<ProviderKind, Arc<dyn PaymentGateway>>,
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Register a gateway under its own kind, replacing any previous one
    pub fn register<G: PaymentGateway + 'static>(&mut self, gateway: G) {
        self.register_arc(Arc::new(gateway));
    }
    
    pub fn register_arc(&mut self, gateway: Arc<dyn PaymentGateway>) {
        self.gateways.insert(gateway.kind(), gateway);
    }
    
    /// Get the gateway for a provider
    pub fn get(&self, kind: ProviderKind) -> Result<Arc<dyn PaymentGateway>> {
        self.gateways
            .get(&kind)
            .cloned()
            .ok_or_else(|| BillingError::Config(format!("no gateway registered for {kind}")))
    }
    
    /// Registered and holding credentials
    pub fn is_configured(&self, kind: ProviderKind) -> bool {
        self.gateways.get(&kind).is_some_and(|g| g.is_configured())
    }
    
    pub fn len(&self) -> usize {
        self.gateways.len()
    }
    
    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty()
    }
}
