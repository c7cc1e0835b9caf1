use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The one entitlement the app cares about
pub const ENTITLEMENT_PREMIUM: &str = "premium";

pub const PRODUCT_MONTHLY: &str = "fraudshield_monthly";
pub const PRODUCT_YEARLY: &str = "fraudshield_yearly";

/// A bundle of products shown together on the paywall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offering {
    pub id: String,
    pub products: Vec<Product>,
}

impl Offering {
    pub fn product(&self, product_id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == product_id)
    }
}

/// Something the user can buy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub title: String,
    /// Display price, already formatted for the storefront ("$4.99")
    pub price: String,
    pub price_value: f64,
    pub period: BillingPeriod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingPeriod {
    Month,
    Year,
}

impl BillingPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingPeriod::Month => "month",
            BillingPeriod::Year => "year",
        }
    }

    /// How many billing cycles fit in a year
    pub fn cycles_per_year(&self) -> u32 {
        match self {
            BillingPeriod::Month => 12,
            BillingPeriod::Year => 1,
        }
    }
}

impl std::fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Product {
    /// What a year of this product costs
    pub fn annual_cost(&self) -> f64 {
        self.price_value * f64::from(self.period.cycles_per_year())
    }

    /// Whole-percent saving of this product over `other` across a year
    ///
    /// Returns 0 when this product is not actually cheaper.
    pub fn savings_percent_over(&self, other: &Product) -> u32 {
        let baseline = other.annual_cost();
        let ours = self.annual_cost();
        if baseline <= 0.0 || ours >= baseline {
            return 0;
        }
        ((1.0 - ours / baseline) * 100.0).floor() as u32
    }
}

/// Entitlements the provider knows about for the current user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurchaserInfo {
    #[serde(default)]
    pub entitlements: HashMap<String, EntitlementInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementInfo {
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
}

impl PurchaserInfo {
    /// Purchaser record holding an active premium entitlement
    pub fn premium_until(expiration_date: DateTime<Utc>) -> Self {
        let mut entitlements = HashMap::new();
        entitlements.insert(
            ENTITLEMENT_PREMIUM.to_string(),
            EntitlementInfo {
                is_active: true,
                expiration_date: Some(expiration_date),
            },
        );
        Self { entitlements }
    }

    pub fn entitlement(&self, id: &str) -> Option<&EntitlementInfo> {
        self.entitlements.get(id)
    }
}

/// The catalog the paywall shows when no provider is wired up
pub fn default_offerings() -> Vec<Offering> {
    vec![Offering {
        id: ENTITLEMENT_PREMIUM.to_string(),
        products: vec![
            Product {
                id: PRODUCT_MONTHLY.to_string(),
                title: "FraudShield Premium".to_string(),
                price: "$4.99".to_string(),
                price_value: 4.99,
                period: BillingPeriod::Month,
            },
            Product {
                id: PRODUCT_YEARLY.to_string(),
                title: "FraudShield Premium".to_string(),
                price: "$39.99".to_string(),
                price_value: 39.99,
                period: BillingPeriod::Year,
            },
        ],
    }]
}

/// Look a product up across every offering
pub fn find_product<'a>(offerings: &'a [Offering], product_id: &str) -> Option<&'a Product> {
    offerings.iter().find_map(|o| o.product(product_id))
}
