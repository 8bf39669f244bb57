//! Subscription Records
//!
//! The one persistent entity, and the state machine that governs it.
//!
//! ```text
//!            begin checkout
//!                  │
//!                  ▼
//!             ┌─────────┐  confirm (paid)  ┌────────┐
//!             │ pending │─────────────────▶│ active │
//!             └─────────┘                  └────────┘
//!                  │                           │
//!                  │ cancel                    │ cancel
//!                  ▼                           ▼
//!             ┌───────────────────────────────────┐
//!             │             cancelled             │
//!             └───────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BillingError, Result};
use crate::pricing::Tier;

/// Unique subscription identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    /// Generate a fresh ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
    
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }
    
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    /// Created, awaiting payment confirmation
    Pending,
    /// Paid for the current term
    Active,
    /// Cancelled by the owner
    Cancelled,
}

impl SubscriptionStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment provider behind a subscription
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    /// Card-network hosted checkout (Stripe)
    #[serde(rename = "stripe")]
    CardNetwork,
    /// Wallet-based checkout (PayPal)
    #[serde(rename = "paypal")]
    Wallet,
    /// Regional processor (Paystack)
    #[serde(rename = "paystack")]
    Regional,
}

impl ProviderKind {
    pub const ALL: [Self; 3] = [Self::CardNetwork, Self::Wallet, Self::Regional];
    
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CardNetwork => "stripe",
            Self::Wallet => "paypal",
            Self::Regional => "paystack",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields fixed at creation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewSubscription {
    pub user_id: String,
    pub tier: Tier,
    pub is_annual: bool,
    pub provider: ProviderKind,
}

/// Outcome of applying a payment confirmation to a record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activation {
    /// pending → active; dates were set
    Activated,
    /// Already active; nothing changed
    AlreadyActive,
    /// Cancelled records stay cancelled
    Cancelled,
}

/// A subscription record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: SubscriptionId,
    
    /// Owning principal
    pub user_id: String,
    
    pub tier: Tier,
    
    pub is_annual: bool,
    
    pub provider: ProviderKind,
    
    pub status: SubscriptionStatus,
    
    /// Provider session/order/transaction reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_subscription_id: Option<String>,
    
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    
    pub created_at: DateTime<Utc>,
    
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Create a pending record
    pub fn pending(id: SubscriptionId, draft: NewSubscription, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: draft.user_id,
            tier: draft.tier,
            is_annual: draft.is_annual,
            provider: draft.provider,
            status: SubscriptionStatus::Pending,
            external_subscription_id: None,
            start_date: None,
            end_date: None,
            created_at: now,
            updated_at: now,
        }
    }
    
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
    
    /// Record the provider reference. Set at most once.
    pub fn attach_external_ref(&mut self, reference: impl Into<String>) -> Result<()> {
        if let Some(existing) = &self.external_subscription_id {
            return Err(BillingError::InvalidTransition(format!(
                "subscription {} already has external reference {existing}",
                self.id
            )));
        }
        self.external_subscription_id = Some(reference.into());
        Ok(())
    }
    
    /// Apply a confirmed payment
    pub fn activate(&mut self, now: DateTime<Utc>) -> Activation {
        match self.status {
            SubscriptionStatus::Pending => {
                self.status = SubscriptionStatus::Active;
                self.start_date = Some(now);
                self.end_date = Some(term_end(now));
                Activation::Activated
            }
            SubscriptionStatus::Active => Activation::AlreadyActive,
            SubscriptionStatus::Cancelled => Activation::Cancelled,
        }
    }
    
    /// Cancel regardless of current status
    pub fn cancel(&mut self) {
        self.status = SubscriptionStatus::Cancelled;
    }
}

/// End of a fixed one-year term
pub fn term_end(start: DateTime<Utc>) -> DateTime<Utc> {
    start
        .checked_add_months(Months::new(12))
        .unwrap_or_else(|| start + Duration::days(365))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft() -> NewSubscription {
        NewSubscription {
            user_id: "user-1".into(),
            tier: Tier::Program,
            is_annual: true,
            provider: ProviderKind::Wallet,
        }
    }

    #[test]
    fn test_pending_record() {
        let now = Utc::now();
        let sub = Subscription::pending(SubscriptionId::generate(), draft(), now);
        assert_eq!(sub.status, SubscriptionStatus::Pending);
        assert!(sub.external_subscription_id.is_none());
        assert!(sub.start_date.is_none());
        assert_eq!(sub.created_at, sub.updated_at);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = SubscriptionId::generate();
        let b = SubscriptionId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn test_external_ref_set_once() {
        let mut sub = Subscription::pending(SubscriptionId::generate(), draft(), Utc::now());
        sub.attach_external_ref("ORDER-1").unwrap();
        assert!(sub.attach_external_ref("ORDER-2").is_err());
        assert_eq!(sub.external_subscription_id.as_deref(), Some("ORDER-1"));
    }

    #[test]
    fn test_activation_sets_one_year_term() {
        let start = Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap();
        let mut sub = Subscription::pending(SubscriptionId::generate(), draft(), start);
        
        assert_eq!(sub.activate(start), Activation::Activated);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.start_date, Some(start));
        assert_eq!(
            sub.end_date,
            Some(Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_second_activation_keeps_dates() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut sub = Subscription::pending(SubscriptionId::generate(), draft(), start);
        sub.activate(start);
        
        let later = start + Duration::days(3);
        assert_eq!(sub.activate(later), Activation::AlreadyActive);
        assert_eq!(sub.start_date, Some(start));
    }

    #[test]
    fn test_cancelled_is_not_reactivated() {
        let mut sub = Subscription::pending(SubscriptionId::generate(), draft(), Utc::now());
        sub.cancel();
        assert_eq!(sub.activate(Utc::now()), Activation::Cancelled);
        assert_eq!(sub.status, SubscriptionStatus::Cancelled);
        assert!(sub.start_date.is_none());
    }

    #[test]
    fn test_leap_day_term() {
        let start = Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap();
        assert_eq!(term_end(start), Utc.with_ymd_and_hms(2025, 2, 28, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_serialized_shape() {
        let sub = Subscription::pending(
            SubscriptionId::from_string("abc"),
            draft(),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        );
        let json = serde_json::to_value(&sub).unwrap();
        assert_eq!(json["id"], "abc");
        assert_eq!(json["userId"], "user-1");
        assert_eq!(json["tier"], "program");
        assert_eq!(json["isAnnual"], true);
        assert_eq!(json["provider"], "paypal");
        assert_eq!(json["status"], "pending");
        assert!(json.get("externalSubscriptionId").is_none());
    }
}
