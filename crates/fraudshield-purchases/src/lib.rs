// Subscription/entitlement provider plumbing
// The paywall talks to a PurchaseGateway; everything else here is an implementation of one
pub mod error;
pub mod gateway;
pub mod models;
pub mod retry;
pub mod revenuecat;
pub mod sandbox;
pub mod service;
pub mod stub;

pub use error::{PurchaseError, Result};
pub use gateway::{is_pro_member, GatewayState, PurchaseGateway, StateTracker};
pub use models::{
    default_offerings, find_product, BillingPeriod, EntitlementInfo, Offering, Product,
    PurchaserInfo, ENTITLEMENT_PREMIUM, PRODUCT_MONTHLY, PRODUCT_YEARLY,
};
pub use retry::RetryConfig;
pub use revenuecat::{RevenueCatClient, RevenueCatGateway};
pub use sandbox::{SandboxBehavior, SandboxGateway};
pub use service::PurchaseService;
pub use stub::StubGateway;
