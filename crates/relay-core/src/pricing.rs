//! Plan Tiers and Pricing
//!
//! All amounts are integer minor currency units (USD cents).
//!
//! | Tier      | Monthly | Annual  |
//! |-----------|---------|---------|
//! | project   | 7900    | 79000   |
//! | program   | 18900   | 189000  |
//! | portfolio | 44900   | 449000  |
//!
//! Annual prices are fixed discounted constants, not twelve monthly payments.

use serde::{Deserialize, Serialize};

/// Subscription plan tiers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Project,
    Program,
    Portfolio,
}

impl Tier {
    pub const ALL: [Self; 3] = [Self::Project, Self::Program, Self::Portfolio];
    
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Program => "program",
            Self::Portfolio => "portfolio",
        }
    }
    
    /// Exact match on the wire name
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.as_str() == s)
    }
    
    /// Unknown or missing tiers fall back to the lowest tier
    pub fn parse_or_default(s: Option<&str>) -> Self {
        s.and_then(Self::parse).unwrap_or_default()
    }
    
    /// Product name shown on provider checkout pages, e.g. "Program Plan"
    pub fn plan_name(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        let capitalized: String = chars
            .next()
            .map(|first| first.to_uppercase().chain(chars).collect())
            .unwrap_or_default();
        format!("{capitalized} Plan")
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monthly and annual price for one tier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierPrice {
    pub monthly: i64,
    pub annual: i64,
}

impl TierPrice {
    pub const fn new(monthly: i64, annual: i64) -> Self {
        Self { monthly, annual }
    }
    
    pub const fn for_cycle(&self, is_annual: bool) -> i64 {
        if is_annual { self.annual } else { self.monthly }
    }
}

/// Per-tier price constants
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTable {
    pub project: TierPrice,
    pub program: TierPrice,
    pub portfolio: TierPrice,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            project: TierPrice::new(7900, 79000),
            program: TierPrice::new(18900, 189_000),
            portfolio: TierPrice::new(44900, 449_000),
        }
    }
}

impl PriceTable {
    pub const fn tier(&self, tier: Tier) -> TierPrice {
        match tier {
            Tier::Project => self.project,
            Tier::Program => self.program,
            Tier::Portfolio => self.portfolio,
        }
    }
    
    /// Replace one tier's prices
    #[must_use]
    pub const fn with_tier(mut self, tier: Tier, price: TierPrice) -> Self {
        match tier {
            Tier::Project => self.project = price,
            Tier::Program => self.program = price,
            Tier::Portfolio => self.portfolio = price,
        }
        self
    }
    
    pub const fn price_of(&self, tier: Tier, is_annual: bool) -> i64 {
        self.tier(tier).for_cycle(is_annual)
    }
    
    /// Resolve a price from a raw tier name. Never fails: unknown tiers
    /// are charged at the project price.
    pub fn price(&self, tier: &str, is_annual: bool) -> i64 {
        self.price_of(Tier::parse_or_default(Some(tier)), is_annual)
    }
}

/// Price lookup against the default table
pub fn price(tier: &str, is_annual: bool) -> i64 {
    PriceTable::default().price(tier, is_annual)
}

/// Render minor units as a major-unit decimal string ("79.00")
pub fn to_major_units(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
