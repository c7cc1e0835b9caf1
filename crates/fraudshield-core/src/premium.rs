use std::str::FromStr;
use std::sync::Arc;

use fraudshield_purchases::{Offering, PurchaseService, PRODUCT_MONTHLY, PRODUCT_YEARLY};
use tracing::{info, warn};

use crate::{store::AppStore, Error, Result};

/// Plans on the paywall
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Plan {
    Monthly,
    /// Pre-selected, it's the better deal
    #[default]
    Yearly,
}

impl Plan {
    pub fn product_id(&self) -> &'static str {
        match self {
            Plan::Monthly => PRODUCT_MONTHLY,
            Plan::Yearly => PRODUCT_YEARLY,
        }
    }

    /// Selling points listed under the plan on the paywall
    pub fn features(&self) -> &'static [&'static str] {
        match self {
            Plan::Monthly => &[
                "Real-time fraud monitoring",
                "Unlimited bank accounts",
                "Advanced threat detection",
                "24/7 priority support",
                "Dark web monitoring",
            ],
            Plan::Yearly => &[
                "Everything in Monthly",
                "Credit score tracking",
                "Identity theft insurance",
                "Family coverage (up to 5)",
                "Early fraud warnings",
                "Priority 24/7 support",
            ],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Monthly => "monthly",
            Plan::Yearly => "yearly",
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Plan {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" | "month" => Ok(Plan::Monthly),
            "yearly" | "year" | "annual" => Ok(Plan::Yearly),
            other => Err(Error::InvalidValue(format!("unknown plan '{}'", other))),
        }
    }
}

/// Wires the paywall to the store
///
/// The store's premium flag is only ever set from a verified entitlement
/// coming back from the purchase service, and is persisted right after.
#[derive(Clone)]
pub struct PremiumManager {
    store: Arc<AppStore>,
    purchases: PurchaseService,
}

impl PremiumManager {
    pub fn new(store: Arc<AppStore>, purchases: PurchaseService) -> Self {
        Self { store, purchases }
    }

    pub async fn offerings(&self) -> Result<Vec<Offering>> {
        Ok(self.purchases.get_offerings().await?)
    }

    /// Buy a plan; true if premium is active afterwards
    pub async fn subscribe(&self, plan: Plan) -> bool {
        let entitled = self.purchases.purchase_product(plan.product_id()).await;
        if entitled {
            info!("Premium unlocked via {} plan", plan);
            self.store.set_premium(true);
            self.store.save_to_storage().await;
        }
        entitled
    }

    /// Restore an earlier purchase; never revokes premium on its own
    pub async fn restore(&self) -> bool {
        let info = self.purchases.restore_purchases().await;
        let entitled = self.purchases.is_pro_member(info.as_ref());
        if entitled {
            info!("Premium restored");
            self.store.set_premium(true);
            self.store.save_to_storage().await;
        }
        entitled
    }

    /// Reconcile the premium flag with what the provider reports
    ///
    /// Unlike `restore`, this clears the flag when the entitlement is gone.
    /// If the provider can't be asked, the flag is left as it is.
    pub async fn refresh(&self) -> bool {
        let info = match self.purchases.restore().await {
            Ok(info) => info,
            Err(e) => {
                warn!("Keeping premium flag, provider check failed: {}", e);
                return self.store.is_premium();
            }
        };
        let entitled = self.purchases.is_pro_member(info.as_ref());
        if entitled != self.store.is_premium() {
            info!("Premium status changed to {}", entitled);
            self.store.set_premium(entitled);
            self.store.save_to_storage().await;
        }
        entitled
    }
}
