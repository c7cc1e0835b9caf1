use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    gateway::{is_pro_member, GatewayState, PurchaseGateway},
    models::{Offering, PurchaserInfo},
    PurchaseError, Result,
};

/// Paywall-facing wrapper around a gateway
///
/// Screens want simple answers: "did the purchase work", "is there anything
/// to restore". This collapses the typed gateway errors into those answers
/// and logs the detail so it isn't lost.
#[derive(Clone)]
pub struct PurchaseService {
    gateway: Arc<dyn PurchaseGateway>,
}

impl PurchaseService {
    pub fn new(gateway: Arc<dyn PurchaseGateway>) -> Self {
        Self { gateway }
    }

    /// Fails only when the provider can't be reached
    pub async fn get_offerings(&self) -> Result<Vec<Offering>> {
        self.gateway.get_offerings().await.map_err(|e| {
            warn!("Failed to load offerings ({}): {}", e.kind(), e);
            match e {
                PurchaseError::ProviderUnavailable(msg) => PurchaseError::ProviderUnavailable(msg),
                other => PurchaseError::ProviderUnavailable(other.to_string()),
            }
        })
    }

    /// True iff the purchase completed and premium is active afterwards
    pub async fn purchase_product(&self, product_id: &str) -> bool {
        match self.purchase(product_id).await {
            Ok(info) => is_pro_member(Some(&info)),
            Err(_) => false,
        }
    }

    /// Same as [`purchase_product`](Self::purchase_product) but keeps the failure kind
    pub async fn purchase(&self, product_id: &str) -> Result<PurchaserInfo> {
        match self.gateway.purchase_product(product_id).await {
            Ok(info) => {
                info!("Purchase of {} completed", product_id);
                Ok(info)
            }
            Err(PurchaseError::UserCancelled) => {
                info!("Purchase of {} cancelled by user", product_id);
                Err(PurchaseError::UserCancelled)
            }
            Err(e) => {
                warn!("Purchase of {} failed ({}): {}", product_id, e.kind(), e);
                Err(e)
            }
        }
    }

    /// Restored record, or `None` if there was nothing to restore or the provider failed
    pub async fn restore_purchases(&self) -> Option<PurchaserInfo> {
        self.restore().await.unwrap_or(None)
    }

    /// Same as [`restore_purchases`](Self::restore_purchases) but a provider
    /// failure stays distinguishable from "nothing to restore"
    pub async fn restore(&self) -> Result<Option<PurchaserInfo>> {
        self.gateway.restore_purchases().await.map_err(|e| {
            warn!("Restore failed ({}): {}", e.kind(), e);
            e
        })
    }

    pub fn is_pro_member(&self, info: Option<&PurchaserInfo>) -> bool {
        is_pro_member(info)
    }

    pub fn state(&self) -> GatewayState {
        self.gateway.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockPurchaseGateway;
    use crate::models::default_offerings;
    use crate::{StubGateway, PRODUCT_YEARLY};
    use chrono::Utc;

    fn service(mock: MockPurchaseGateway) -> PurchaseService {
        PurchaseService::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn test_purchase_success_is_true() {
        let mut mock = MockPurchaseGateway::new();
        mock.expect_purchase_product()
            .withf(|id| id.to_string() == PRODUCT_YEARLY)
            .times(1)
            .returning(|_| Ok(PurchaserInfo::premium_until(Utc::now())));

        assert!(service(mock).purchase_product(PRODUCT_YEARLY).await);
    }

    #[tokio::test]
    async fn test_purchase_without_entitlement_is_false() {
        let mut mock = MockPurchaseGateway::new();
        mock.expect_purchase_product()
            .returning(|_| Ok(PurchaserInfo::default()));

        assert!(!service(mock).purchase_product(PRODUCT_YEARLY).await);
    }

    #[tokio::test]
    async fn test_every_failure_kind_collapses_to_false() {
        let failures: [fn() -> PurchaseError; 3] = [
            || PurchaseError::UserCancelled,
            || PurchaseError::PaymentDeclined("card".into()),
            || PurchaseError::ProviderUnavailable("down".into()),
        ];
        for make in failures {
            let mut mock = MockPurchaseGateway::new();
            mock.expect_purchase_product().returning(move |_| Err(make()));
            assert!(!service(mock).purchase_product(PRODUCT_YEARLY).await);
        }
    }

    #[tokio::test]
    async fn test_typed_purchase_keeps_kind() {
        let mut mock = MockPurchaseGateway::new();
        mock.expect_purchase_product()
            .returning(|_| Err(PurchaseError::UserCancelled));

        let err = service(mock).purchase(PRODUCT_YEARLY).await.unwrap_err();
        assert_eq!(err.kind(), "user_cancelled");
    }

    #[tokio::test]
    async fn test_restore_error_collapses_to_none() {
        let mut mock = MockPurchaseGateway::new();
        mock.expect_restore_purchases()
            .returning(|| Err(PurchaseError::Provider("boom".into())));

        assert!(service(mock).restore_purchases().await.is_none());
    }

    #[tokio::test]
    async fn test_typed_restore_keeps_provider_failure() {
        let mut mock = MockPurchaseGateway::new();
        mock.expect_restore_purchases()
            .returning(|| Err(PurchaseError::ProviderUnavailable("network down".into())));

        let err = service(mock).restore().await.unwrap_err();
        assert!(err.is_provider_failure());
    }

    #[tokio::test]
    async fn test_typed_restore_nothing_to_restore() {
        let mut mock = MockPurchaseGateway::new();
        mock.expect_restore_purchases().returning(|| Ok(None));

        assert_eq!(service(mock).restore().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_offerings_failure_is_provider_unavailable() {
        let mut mock = MockPurchaseGateway::new();
        mock.expect_get_offerings()
            .returning(|| Err(PurchaseError::AuthRequired));

        let err = service(mock).get_offerings().await.unwrap_err();
        assert!(matches!(err, PurchaseError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn test_stub_backed_service() {
        let service = PurchaseService::new(Arc::new(StubGateway::new()));

        assert_eq!(service.get_offerings().await.unwrap(), default_offerings());
        assert!(!service.purchase_product(PRODUCT_YEARLY).await);
        assert!(service.restore_purchases().await.is_none());
        assert!(!service.is_pro_member(None));
        assert_eq!(service.state(), GatewayState::NotEntitled);
    }
}
