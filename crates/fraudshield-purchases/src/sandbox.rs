use std::sync::{Mutex, PoisonError};

use chrono::{Duration, Utc};
use tracing::info;

use crate::{
    gateway::{GatewayState, PurchaseGateway, StateTracker},
    models::{default_offerings, find_product, Offering, PurchaserInfo},
    PurchaseError, Result,
};

/// How long a sandbox purchase keeps premium active
const SANDBOX_ENTITLEMENT_DAYS: i64 = 30;

/// What the sandbox storefront does when asked to buy something
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SandboxBehavior {
    #[default]
    Approve,
    Cancel,
    Decline,
}

/// Demo gateway: purchases of catalog products always go through
///
/// Useful for walking the paywall end to end without a storefront account.
/// The purchaser record lives in memory only.
#[derive(Debug, Default)]
pub struct SandboxGateway {
    state: StateTracker,
    behavior: SandboxBehavior,
    purchaser_info: Mutex<Option<PurchaserInfo>>,
}

impl SandboxGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(behavior: SandboxBehavior) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }

    fn current(&self) -> Option<PurchaserInfo> {
        self.purchaser_info
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl PurchaseGateway for SandboxGateway {
    async fn get_offerings(&self) -> Result<Vec<Offering>> {
        self.state.initialize("sandbox");
        Ok(default_offerings())
    }

    async fn purchase_product(&self, product_id: &str) -> Result<PurchaserInfo> {
        self.state.initialize("sandbox");
        info!("Sandbox purchase requested: {}", product_id);

        let offerings = default_offerings();
        if find_product(&offerings, product_id).is_none() {
            return Err(PurchaseError::ProductNotFound(product_id.to_string()));
        }

        match self.behavior {
            SandboxBehavior::Approve => {}
            SandboxBehavior::Cancel => return Err(PurchaseError::UserCancelled),
            SandboxBehavior::Decline => {
                self.state.record(self.current().as_ref());
                return Err(PurchaseError::PaymentDeclined(
                    "sandbox card declined".to_string(),
                ));
            }
        }

        let info =
            PurchaserInfo::premium_until(Utc::now() + Duration::days(SANDBOX_ENTITLEMENT_DAYS));
        *self
            .purchaser_info
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(info.clone());
        self.state.record(Some(&info));

        Ok(info)
    }

    async fn restore_purchases(&self) -> Result<Option<PurchaserInfo>> {
        self.state.initialize("sandbox");
        let info = self.current();
        self.state.record(info.as_ref());
        Ok(info)
    }

    fn state(&self) -> GatewayState {
        self.state.get()
    }
}
