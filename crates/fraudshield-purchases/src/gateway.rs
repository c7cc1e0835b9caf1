use std::sync::{Mutex, PoisonError};

use tracing::info;

use crate::{
    models::{Offering, PurchaserInfo, ENTITLEMENT_PREMIUM},
    Result,
};

/// Trait for purchase providers - the paywall only ever sees this
///
/// Real SDKs, the sandbox and the do-nothing stub all implement it, so the
/// upgrade flow can be tested without a storefront.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PurchaseGateway: Send + Sync {
    async fn get_offerings(&self) -> Result<Vec<Offering>>;

    /// Buy a product; on success returns the purchaser record afterwards
    async fn purchase_product(&self, product_id: &str) -> Result<PurchaserInfo>;

    /// `Ok(None)` means there was nothing to restore
    async fn restore_purchases(&self) -> Result<Option<PurchaserInfo>>;

    fn state(&self) -> GatewayState;
}

/// Where a gateway is in its lifecycle
///
/// Unconfigured -> Initialized -> {Entitled, NotEntitled}
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GatewayState {
    #[default]
    Unconfigured,
    Initialized,
    Entitled,
    NotEntitled,
}

impl std::fmt::Display for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayState::Unconfigured => write!(f, "unconfigured"),
            GatewayState::Initialized => write!(f, "initialized"),
            GatewayState::Entitled => write!(f, "entitled"),
            GatewayState::NotEntitled => write!(f, "not entitled"),
        }
    }
}

/// Shared lifecycle bookkeeping for gateway implementations
#[derive(Debug, Default)]
pub struct StateTracker {
    state: Mutex<GatewayState>,
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> GatewayState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lazy, idempotent initialization. Returns true on the first call only.
    pub fn initialize(&self, provider: &str) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != GatewayState::Unconfigured {
            return false;
        }
        *state = GatewayState::Initialized;
        info!("{} purchase gateway initialized", provider);
        true
    }

    /// Move to Entitled/NotEntitled based on what the provider reported
    pub fn record(&self, info: Option<&PurchaserInfo>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = if is_pro_member(info) {
            GatewayState::Entitled
        } else {
            GatewayState::NotEntitled
        };
    }
}

/// True iff the premium entitlement exists and is active
///
/// A missing record is simply "not a member", never an error.
pub fn is_pro_member(info: Option<&PurchaserInfo>) -> bool {
    info.and_then(|i| i.entitlement(ENTITLEMENT_PREMIUM))
        .map(|e| e.is_active)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntitlementInfo;
    use std::collections::HashMap;

    #[test]
    fn test_is_pro_member_none() {
        assert!(!is_pro_member(None));
    }

    #[test]
    fn test_is_pro_member_active_premium() {
        let mut entitlements = HashMap::new();
        entitlements.insert(
            "premium".to_string(),
            EntitlementInfo {
                is_active: true,
                expiration_date: None,
            },
        );
        let info = PurchaserInfo { entitlements };
        assert!(is_pro_member(Some(&info)));
    }

    #[test]
    fn test_is_pro_member_empty_entitlements() {
        let info = PurchaserInfo::default();
        assert!(!is_pro_member(Some(&info)));
    }

    #[test]
    fn test_is_pro_member_inactive_or_other_entitlement() {
        let mut entitlements = HashMap::new();
        entitlements.insert(
            "premium".to_string(),
            EntitlementInfo {
                is_active: false,
                expiration_date: None,
            },
        );
        entitlements.insert(
            "family".to_string(),
            EntitlementInfo {
                is_active: true,
                expiration_date: None,
            },
        );
        let info = PurchaserInfo { entitlements };
        assert!(!is_pro_member(Some(&info)));
    }

    #[test]
    fn test_state_tracker_lifecycle() {
        let tracker = StateTracker::new();
        assert_eq!(tracker.get(), GatewayState::Unconfigured);

        assert!(tracker.initialize("test"));
        assert!(!tracker.initialize("test"));
        assert_eq!(tracker.get(), GatewayState::Initialized);

        tracker.record(None);
        assert_eq!(tracker.get(), GatewayState::NotEntitled);

        tracker.record(Some(&PurchaserInfo::premium_until(chrono::Utc::now())));
        assert_eq!(tracker.get(), GatewayState::Entitled);
    }
}
