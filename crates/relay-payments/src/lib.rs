//! # relay-payments
//!
//! Payment provider adapters for tier-relay.
//!
//! Each adapter implements `relay_core::PaymentGateway`:
//!
//! | Provider | Role          | Auth                         | Encoding | Correlation echo                |
//! |----------|---------------|------------------------------|----------|---------------------------------|
//! | Stripe   | card network  | bearer secret key            | form     | `metadata.subscription_id`      |
//! | PayPal   | wallet        | Basic → client-credentials   | JSON     | `purchase_units[0].custom_id`   |
//! | Paystack | regional      | bearer secret key            | JSON     | `data.metadata.subscription_id` |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relay_core::GatewayRegistry;
//! use relay_payments::{PayPalGateway, PaystackGateway, StripeGateway};
//!
//! let http = reqwest::Client::new();
//! let mut gateways = GatewayRegistry::new();
//! gateways.register(StripeGateway::from_env());
//! gateways.register(PayPalGateway::from_env(http.clone()));
//! gateways.register(PaystackGateway::from_env(http));
//! ```
//!
//! Adapters built without credentials still register; they report
//! `is_configured() == false` and fail every call with `ProviderAuth`.

mod error;
mod http;
mod paypal;
mod paystack;
mod stripe;

pub use paypal::{PayPalConfig, PayPalGateway};
pub use paystack::{PaystackConfig, PaystackGateway};
pub use stripe::StripeGateway;
