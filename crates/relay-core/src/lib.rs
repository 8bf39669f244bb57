//! # relay-core
//!
//! Subscription lifecycle, pricing and payment provider abstraction.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   SubscriptionLifecycle                       │
//! │  ┌─────────────┐  ┌───────────────────┐  ┌────────────────┐  │
//! │  │ PriceTable  │  │  GatewayRegistry  │  │ Subscription   │  │
//! │  │             │──│  (Strategy)       │──│ Store          │  │
//! │  └─────────────┘  └───────────────────┘  └────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `PaymentGateway` trait lets Stripe, PayPal and Paystack share one
//! lifecycle; the `SubscriptionStore` and `IdentityVerifier` traits keep the
//! document store and token verification swappable.

pub mod auth;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod pricing;
pub mod store;
pub mod subscription;

pub use auth::{Identity, IdentityVerifier, StaticTokenVerifier};
pub use error::{BillingError, Result};
pub use gateway::{
    CheckoutRequest, GatewayRegistry, PaymentConfirmation, PaymentGateway, ProviderCheckout,
};
pub use lifecycle::{CheckoutCommand, CheckoutStarted, ConfirmOutcome, SubscriptionLifecycle};
pub use pricing::{price, PriceTable, Tier, TierPrice};
pub use store::{MemorySubscriptionStore, Mutation, SubscriptionStore};
pub use subscription::{
    ProviderKind, Subscription, SubscriptionId, SubscriptionStatus,
};
