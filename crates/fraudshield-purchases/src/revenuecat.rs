use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::{
    gateway::{GatewayState, PurchaseGateway, StateTracker},
    models::{
        default_offerings, find_product, BillingPeriod, EntitlementInfo, Offering, Product,
        PurchaserInfo,
    },
    retry::{is_retryable_status, with_retry, RetryConfig},
    PurchaseError, Result,
};

const REVENUECAT_API_BASE: &str = "https://api.revenuecat.com/v1";

/// Subscriber lookup response
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriberResponse {
    pub subscriber: Subscriber,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subscriber {
    #[serde(default)]
    pub original_app_user_id: Option<String>,
    #[serde(default)]
    pub entitlements: HashMap<String, SubscriberEntitlement>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriberEntitlement {
    /// `None` for lifetime entitlements
    pub expires_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub product_identifier: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OfferingsResponse {
    #[serde(default)]
    pub current_offering_id: Option<String>,
    #[serde(default)]
    pub offerings: Vec<RemoteOffering>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteOffering {
    pub identifier: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub packages: Vec<RemotePackage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemotePackage {
    pub identifier: String,
    pub platform_product_identifier: String,
}

impl Subscriber {
    /// Collapse the provider's entitlement list into our purchaser record
    pub fn to_purchaser_info(&self, now: DateTime<Utc>) -> PurchaserInfo {
        let entitlements = self
            .entitlements
            .iter()
            .map(|(id, ent)| {
                let is_active = ent.expires_date.map_or(true, |expires| expires > now);
                (
                    id.clone(),
                    EntitlementInfo {
                        is_active,
                        expiration_date: ent.expires_date,
                    },
                )
            })
            .collect();

        PurchaserInfo { entitlements }
    }
}

impl OfferingsResponse {
    /// Map remote packages onto catalog products
    ///
    /// The REST API only names products; prices live in the storefront, so
    /// anything outside the local catalog is shown with an empty price.
    pub fn to_offerings(&self) -> Vec<Offering> {
        let catalog = default_offerings();

        self.offerings
            .iter()
            .map(|remote| Offering {
                id: remote.identifier.clone(),
                products: remote
                    .packages
                    .iter()
                    .map(|pkg| {
                        find_product(&catalog, &pkg.platform_product_identifier)
                            .cloned()
                            .unwrap_or_else(|| Product {
                                id: pkg.platform_product_identifier.clone(),
                                title: remote
                                    .description
                                    .clone()
                                    .unwrap_or_else(|| remote.identifier.clone()),
                                price: String::new(),
                                price_value: 0.0,
                                period: package_period(&pkg.identifier),
                            })
                    })
                    .collect(),
            })
            .collect()
    }
}

/// RevenueCat's well-known package identifiers carry the billing period
fn package_period(package_id: &str) -> BillingPeriod {
    match package_id {
        "$rc_annual" => BillingPeriod::Year,
        _ => BillingPeriod::Month,
    }
}

fn is_transient(err: &PurchaseError) -> bool {
    matches!(
        err,
        PurchaseError::ProviderUnavailable(_) | PurchaseError::NetworkError(_)
    )
}

/// REST client for the subscription provider
pub struct RevenueCatClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    retry_config: RetryConfig,
}

impl RevenueCatClient {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(api_key, REVENUECAT_API_BASE.to_string())
    }

    /// Point at a different host (proxies, tests)
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("FraudShield/0.1.0"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_config: RetryConfig::default(),
        })
    }

    pub fn retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// Fetch the subscriber record, creating it provider-side if new
    pub async fn get_subscriber(&self, app_user_id: &str) -> Result<Subscriber> {
        let url = format!(
            "{}/subscribers/{}",
            self.base_url,
            urlencoding::encode(app_user_id)
        );
        let response: SubscriberResponse = self.get_json(&url).await?;
        Ok(response.subscriber)
    }

    /// Fetch the offerings configured for this subscriber
    pub async fn get_offerings(&self, app_user_id: &str) -> Result<OfferingsResponse> {
        let url = format!(
            "{}/subscribers/{}/offerings",
            self.base_url,
            urlencoding::encode(app_user_id)
        );
        self.get_json(&url).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        with_retry(&self.retry_config, is_transient, || async {
            debug!("GET {}", url);
            let response = self
                .client
                .get(url)
                .bearer_auth(&self.api_key)
                .header("X-Platform", "ios")
                .send()
                .await?;

            let status = response.status();

            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                return Err(PurchaseError::AuthRequired);
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();

                if is_retryable_status(status) {
                    return Err(PurchaseError::ProviderUnavailable(format!(
                        "Status {}: {}",
                        status, body
                    )));
                }

                return Err(PurchaseError::Provider(format!(
                    "Status {}: {}",
                    status, body
                )));
            }

            let body = response.text().await?;
            Ok(serde_json::from_str(&body)?)
        })
        .await
    }
}

/// Gateway backed by the provider's REST API
///
/// Offerings and restores work over HTTP. Buying needs the on-device
/// storefront SDK, so purchases report the provider as unavailable.
pub struct RevenueCatGateway {
    client: RevenueCatClient,
    app_user_id: String,
    state: StateTracker,
}

impl RevenueCatGateway {
    pub fn new(client: RevenueCatClient, app_user_id: String) -> Self {
        Self {
            client,
            app_user_id,
            state: StateTracker::new(),
        }
    }
}

#[async_trait::async_trait]
impl PurchaseGateway for RevenueCatGateway {
    async fn get_offerings(&self) -> Result<Vec<Offering>> {
        self.state.initialize("revenuecat");
        let response = self
            .client
            .get_offerings(&self.app_user_id)
            .await
            .map_err(|e| match e {
                PurchaseError::NetworkError(err) => {
                    PurchaseError::ProviderUnavailable(err.to_string())
                }
                other => other,
            })?;

        let offerings = response.to_offerings();
        info!("Fetched {} offerings", offerings.len());
        Ok(offerings)
    }

    async fn purchase_product(&self, product_id: &str) -> Result<PurchaserInfo> {
        self.state.initialize("revenuecat");
        Err(PurchaseError::ProviderUnavailable(format!(
            "purchasing {} requires the device storefront",
            product_id
        )))
    }

    async fn restore_purchases(&self) -> Result<Option<PurchaserInfo>> {
        self.state.initialize("revenuecat");
        let subscriber = self.client.get_subscriber(&self.app_user_id).await?;
        let info = subscriber.to_purchaser_info(Utc::now());
        self.state.record(Some(&info));

        if info.entitlements.is_empty() {
            Ok(None)
        } else {
            Ok(Some(info))
        }
    }

    fn state(&self) -> GatewayState {
        self.state.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{is_pro_member, PRODUCT_MONTHLY, PRODUCT_YEARLY};

    const SUBSCRIBER_JSON: &str = r#"{
        "request_date": "2026-02-14T12:00:00Z",
        "subscriber": {
            "original_app_user_id": "user-123",
            "entitlements": {
                "premium": {
                    "expires_date": "2026-03-14T12:00:00Z",
                    "product_identifier": "fraudshield_monthly",
                    "purchase_date": "2026-02-14T12:00:00Z"
                },
                "legacy": {
                    "expires_date": null,
                    "product_identifier": "fraudshield_lifetime"
                }
            }
        }
    }"#;

    #[test]
    fn test_subscriber_active_entitlement() {
        let response: SubscriberResponse = serde_json::from_str(SUBSCRIBER_JSON).unwrap();
        let now = "2026-02-20T00:00:00Z".parse().unwrap();
        let info = response.subscriber.to_purchaser_info(now);

        assert!(is_pro_member(Some(&info)));
        assert!(info.entitlement("legacy").unwrap().is_active);
    }

    #[test]
    fn test_subscriber_expired_entitlement() {
        let response: SubscriberResponse = serde_json::from_str(SUBSCRIBER_JSON).unwrap();
        let now = "2026-04-01T00:00:00Z".parse().unwrap();
        let info = response.subscriber.to_purchaser_info(now);

        assert!(!is_pro_member(Some(&info)));
    }

    #[test]
    fn test_offerings_map_onto_catalog() {
        let json = r#"{
            "current_offering_id": "premium",
            "offerings": [{
                "identifier": "premium",
                "description": "FraudShield Premium",
                "packages": [
                    {"identifier": "$rc_monthly", "platform_product_identifier": "fraudshield_monthly"},
                    {"identifier": "$rc_annual", "platform_product_identifier": "fraudshield_yearly"},
                    {"identifier": "$rc_annual", "platform_product_identifier": "fraudshield_family"}
                ]
            }]
        }"#;
        let response: OfferingsResponse = serde_json::from_str(json).unwrap();
        let offerings = response.to_offerings();

        assert_eq!(offerings.len(), 1);
        let products = &offerings[0].products;
        assert_eq!(products[0].id, PRODUCT_MONTHLY);
        assert_eq!(products[0].price, "$4.99");
        assert_eq!(products[1].id, PRODUCT_YEARLY);
        assert_eq!(products[2].price, "");
        assert_eq!(products[2].period, BillingPeriod::Year);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_provider_unavailable() {
        let client = RevenueCatClient::with_base_url(
            "test-key".to_string(),
            "http://127.0.0.1:9".to_string(),
        )
        .unwrap()
        .retry_config(RetryConfig::none());
        let gateway = RevenueCatGateway::new(client, "user-123".to_string());

        let err = gateway.get_offerings().await.unwrap_err();
        assert!(matches!(err, PurchaseError::ProviderUnavailable(_)));
        assert_eq!(gateway.state(), GatewayState::Initialized);
    }

    #[tokio::test]
    async fn test_purchase_needs_device_storefront() {
        let client = RevenueCatClient::new("test-key".to_string()).unwrap();
        let gateway = RevenueCatGateway::new(client, "user-123".to_string());

        let err = gateway.purchase_product(PRODUCT_MONTHLY).await.unwrap_err();
        assert!(matches!(err, PurchaseError::ProviderUnavailable(_)));
    }
}
