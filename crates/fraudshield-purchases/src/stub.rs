use tracing::{debug, warn};

use crate::{
    gateway::{GatewayState, PurchaseGateway, StateTracker},
    models::{default_offerings, Offering, PurchaserInfo},
    PurchaseError, Result,
};

/// Gateway used when no purchase provider is configured
///
/// Serves the fixed catalog so the paywall can render, but can never grant
/// an entitlement: purchases fail and there is never anything to restore.
#[derive(Debug, Default)]
pub struct StubGateway {
    state: StateTracker,
}

impl StubGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl PurchaseGateway for StubGateway {
    async fn get_offerings(&self) -> Result<Vec<Offering>> {
        self.state.initialize("stub");
        Ok(default_offerings())
    }

    async fn purchase_product(&self, product_id: &str) -> Result<PurchaserInfo> {
        self.state.initialize("stub");
        warn!("Purchase requested for {} but no provider is configured", product_id);
        self.state.record(None);
        Err(PurchaseError::Provider(
            "purchases are not configured".to_string(),
        ))
    }

    async fn restore_purchases(&self) -> Result<Option<PurchaserInfo>> {
        self.state.initialize("stub");
        debug!("Nothing to restore from the stub gateway");
        self.state.record(None);
        Ok(None)
    }

    fn state(&self) -> GatewayState {
        self.state.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_serves_catalog() {
        let gateway = StubGateway::new();
        assert_eq!(gateway.state(), GatewayState::Unconfigured);

        let offerings = gateway.get_offerings().await.unwrap();
        assert_eq!(offerings, default_offerings());
        assert_eq!(gateway.state(), GatewayState::Initialized);
    }

    #[tokio::test]
    async fn test_stub_never_entitles() {
        let gateway = StubGateway::new();

        let err = gateway
            .purchase_product(crate::PRODUCT_YEARLY)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "provider_error");
        assert_eq!(gateway.state(), GatewayState::NotEntitled);

        assert!(gateway.restore_purchases().await.unwrap().is_none());
        assert_eq!(gateway.state(), GatewayState::NotEntitled);
    }
}
