use thiserror::Error;

/// Why a purchase-provider call didn't produce what the caller wanted
///
/// The paywall mostly only cares "did it work", but keeping the kinds apart
/// lets callers tell a user who backed out from a card that bounced.
#[derive(Error, Debug)]
pub enum PurchaseError {
    #[error("Purchase provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Purchase cancelled by user")]
    UserCancelled,

    #[error("Payment declined: {0}")]
    PaymentDeclined(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Authentication required")]
    AuthRequired,

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl PurchaseError {
    /// Short machine-friendly tag, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            PurchaseError::ProviderUnavailable(_) => "provider_unavailable",
            PurchaseError::UserCancelled => "user_cancelled",
            PurchaseError::PaymentDeclined(_) => "payment_declined",
            PurchaseError::ProductNotFound(_) => "product_not_found",
            PurchaseError::AuthRequired => "auth_required",
            PurchaseError::Provider(_) => "provider_error",
            PurchaseError::NetworkError(_) => "network_error",
            PurchaseError::ParseError(_) => "parse_error",
        }
    }

    /// True when the provider itself couldn't be reached or understood
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            PurchaseError::ProviderUnavailable(_)
                | PurchaseError::AuthRequired
                | PurchaseError::Provider(_)
                | PurchaseError::NetworkError(_)
                | PurchaseError::ParseError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PurchaseError>;
