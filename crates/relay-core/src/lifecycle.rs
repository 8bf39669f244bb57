//! Subscription Lifecycle Controller
//!
//! Orchestrates the three transitions of a subscription record:
//!
//! 1. **begin checkout**: write a pending record, open a provider checkout,
//!    remember the provider reference.
//! 2. **confirm payment**: ask the provider whether the checkout was paid
//!    and, if so, activate the record the provider correlates it to.
//! 3. **cancel**: owner-initiated, allowed from any status.
//!
//! There is no compensation step. If the provider call in (1) fails the
//! pending record stays behind and the error goes back to the caller.

use std::sync::Arc;

use chrono::Utc;

use crate::error::{BillingError, Result};
use crate::gateway::{CheckoutRequest, GatewayRegistry, PaymentGateway, ProviderCheckout};
use crate::pricing::{PriceTable, Tier};
use crate::store::SubscriptionStore;
use crate::subscription::{
    Activation, NewSubscription, ProviderKind, Subscription, SubscriptionId,
};

/// Request to start a checkout
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutCommand {
    /// Verified caller
    pub user_id: String,
    
    pub provider: ProviderKind,
    
    pub tier: Tier,
    
    pub is_annual: bool,
    
    pub email: Option<String>,
    
    /// Origin to build return URLs from
    pub return_origin: String,
}

/// A started checkout
#[derive(Clone, Debug)]
pub struct CheckoutStarted {
    /// The persisted record, now carrying the provider reference
    pub subscription: Subscription,
    
    pub checkout: ProviderCheckout,
}

/// Result of a confirmation attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Provider reports the payment complete
    Confirmed {
        /// The record that was matched, if the provider correlated one
        subscription_id: Option<SubscriptionId>,
    },
    
    /// Not paid yet; nothing was changed
    NotCompleted,
}

/// Lifecycle controller
pub struct SubscriptionLifecycle {
    store: Arc<dyn SubscriptionStore>,
    gateways: GatewayRegistry,
    prices: PriceTable,
}

impl SubscriptionLifecycle {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        gateways: GatewayRegistry,
        prices: PriceTable,
    ) -> Self {
        Self { store, gateways, prices }
    }
    
    pub const fn gateways(&self) -> &GatewayRegistry {
        &self.gateways
    }
    
    /// Look up a configured gateway
    fn gateway(&self, kind: ProviderKind) -> Result<Arc<dyn PaymentGateway>> {
        let gateway = self.gateways.get(kind)?;
        if !gateway.is_configured() {
            tracing::error!(provider = %kind, "Payment provider credentials not configured");
            return Err(BillingError::Config(format!("{kind} credentials not configured")));
        }
        Ok(gateway)
    }
    
    /// Create a pending subscription and open a provider checkout for it
    pub async fn begin_checkout(&self, command: CheckoutCommand) -> Result<CheckoutStarted> {
        let gateway = self.gateway(command.provider)?;
        let amount = self.prices.price_of(command.tier, command.is_annual);
        
        let subscription = self
            .store
            .create(NewSubscription {
                user_id: command.user_id.clone(),
                tier: command.tier,
                is_annual: command.is_annual,
                provider: command.provider,
            })
            .await?;
        
        tracing::info!(
            subscription_id = %subscription.id,
            provider = %command.provider,
            tier = %command.tier,
            is_annual = command.is_annual,
            amount,
            "Created pending subscription"
        );
        
        let request = CheckoutRequest {
            subscription_id: subscription.id.clone(),
            user_id: command.user_id,
            tier: command.tier,
            is_annual: command.is_annual,
            amount,
            email: command.email,
            return_origin: command.return_origin,
        };
        
        let checkout = gateway.begin_checkout(&request).await.inspect_err(|e| {
            tracing::warn!(
                subscription_id = %subscription.id,
                provider = %command.provider,
                error = %e,
                "Provider checkout failed; pending record left in place"
            );
        })?;
        
        let reference = checkout.external_ref.clone();
        let subscription = self
            .store
            .modify(
                &subscription.id,
                Box::new(move |record: &mut Subscription| {
                    record.attach_external_ref(reference)?;
                    Ok(true)
                }),
            )
            .await?;
        
        tracing::info!(
            subscription_id = %subscription.id,
            external_ref = %checkout.external_ref,
            "Provider checkout opened"
        );
        
        Ok(CheckoutStarted { subscription, checkout })
    }
    
    /// Confirm a provider payment and activate the matching subscription
    pub async fn confirm_payment(
        &self,
        provider: ProviderKind,
        reference: &str,
    ) -> Result<ConfirmOutcome> {
        let gateway = self.gateway(provider)?;
        let confirmation = gateway.confirm_payment(reference).await?;
        
        if !confirmation.paid {
            tracing::info!(provider = %provider, reference, "Payment not completed");
            return Ok(ConfirmOutcome::NotCompleted);
        }
        
        let subscription_id = confirmation
            .correlation_id
            .filter(|id| !id.is_empty())
            .or_else(|| {
                gateway
                    .reference_is_subscription_id()
                    .then(|| reference.to_string())
            })
            .map(SubscriptionId::from_string);
        
        let Some(subscription_id) = subscription_id else {
            tracing::warn!(
                provider = %provider,
                reference,
                "Paid checkout carried no subscription ID; nothing activated"
            );
            return Ok(ConfirmOutcome::Confirmed { subscription_id: None });
        };
        
        self.activate(&subscription_id).await?;
        
        Ok(ConfirmOutcome::Confirmed {
            subscription_id: Some(subscription_id),
        })
    }
    
    async fn activate(&self, id: &SubscriptionId) -> Result<()> {
        let now = Utc::now();
        let mut outcome = Activation::AlreadyActive;
        
        let saved = self
            .store
            .modify(
                id,
                Box::new(|record: &mut Subscription| {
                    outcome = record.activate(now);
                    Ok(outcome == Activation::Activated)
                }),
            )
            .await?;
        
        match outcome {
            Activation::Activated => {
                tracing::info!(
                    subscription_id = %id,
                    end_date = ?saved.end_date,
                    "Subscription activated"
                );
            }
            Activation::AlreadyActive => {
                tracing::debug!(subscription_id = %id, "Subscription already active");
            }
            Activation::Cancelled => {
                tracing::warn!(
                    subscription_id = %id,
                    "Payment confirmed for a cancelled subscription; left cancelled"
                );
            }
        }
        
        Ok(())
    }
    
    /// Cancel a subscription on behalf of its owner
    pub async fn cancel(&self, user_id: &str, id: &SubscriptionId) -> Result<Subscription> {
        let mut previous = None;
        
        let saved = self
            .store
            .modify(
                id,
                Box::new(|record: &mut Subscription| {
                    if !record.is_owned_by(user_id) {
                        return Err(BillingError::Forbidden);
                    }
                    previous = Some(record.status);
                    record.cancel();
                    Ok(true)
                }),
            )
            .await
            .inspect_err(|e| {
                if matches!(e, BillingError::Forbidden) {
                    tracing::warn!(subscription_id = %id, user_id, "Cancel attempted by non-owner");
                }
            })?;
        
        tracing::info!(subscription_id = %id, previous = ?previous, "Subscription cancelled");
        
        Ok(saved)
    }
}
