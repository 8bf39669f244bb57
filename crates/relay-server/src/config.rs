//! Server Configuration
//!
//! Everything is read once at boot. Provider credentials live with their
//! adapters (`PayPalConfig::from_env` etc.); this module covers the HTTP
//! surface, pricing and token verification.

use relay_core::{PriceTable, Tier, TierPrice};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_APP_ORIGIN: &str = "https://app.example.com";
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &["http://localhost:3000", "http://localhost:5000"];
pub const DEFAULT_ALLOWED_SUFFIXES: &[&str] = &[".web.app", ".firebaseapp.com"];

/// HS256 token settings
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

/// Browser origins allowed to call the API
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorsConfig {
    /// Exact origins
    pub origins: Vec<String>,
    
    /// Trusted host suffixes, e.g. `.web.app`
    pub suffixes: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: DEFAULT_ALLOWED_ORIGINS.iter().map(ToString::to_string).collect(),
            suffixes: DEFAULT_ALLOWED_SUFFIXES.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    
    /// Fallback redirect origin when a request carries no `Origin` header
    pub app_origin: String,
    
    pub cors: CorsConfig,
    pub prices: PriceTable,
    
    /// `None` rejects every authenticated request
    pub jwt: Option<JwtConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.into(),
            app_origin: DEFAULT_APP_ORIGIN.into(),
            cors: CorsConfig::default(),
            prices: PriceTable::default(),
            jwt: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
    
    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = CorsConfig::default();
        
        let cors = CorsConfig {
            origins: var("CORS_ALLOWED_ORIGINS").map_or(defaults.origins, |v| csv_list(&v)),
            suffixes: var("CORS_ALLOWED_SUFFIXES").map_or(defaults.suffixes, |v| csv_list(&v)),
        };
        
        let jwt = var("AUTH_JWT_SECRET").map(|secret| JwtConfig {
            secret,
            issuer: var("AUTH_JWT_ISSUER"),
            audience: var("AUTH_JWT_AUDIENCE"),
        });
        
        Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            app_origin: var("APP_ORIGIN").unwrap_or_else(|| DEFAULT_APP_ORIGIN.into()),
            cors,
            prices: price_table(&var),
            jwt,
        }
    }
}

fn csv_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Apply `PRICE_<TIER>_MONTHLY` / `PRICE_<TIER>_ANNUAL` overrides (minor units).
fn price_table(var: &impl Fn(&str) -> Option<String>) -> PriceTable {
    Tier::ALL.iter().fold(PriceTable::default(), |table, &tier| {
        let current = table.tier(tier);
        let upper = tier.as_str().to_uppercase();
        
        let read = |cycle: &str, fallback: i64| {
            let name = format!("PRICE_{upper}_{cycle}");
            match var(&name).map(|v| v.trim().parse::<i64>()) {
                Some(Ok(amount)) if amount > 0 => amount,
                Some(_) => {
                    tracing::warn!(variable = %name, "Ignoring invalid price override");
                    fallback
                }
                None => fallback,
            }
        };
        
        let price = TierPrice::new(read("MONTHLY", current.monthly), read("ANNUAL", current.annual));
        table.with_tier(tier, price)
    })
}
