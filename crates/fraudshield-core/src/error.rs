use thiserror::Error;

/// All the ways things can go wrong in FraudShield's core
///
/// Store actions never surface these to screens; they show up from the
/// `try_` variants and from setup code (config, opening storage).
#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] fraudshield_storage::StorageError),

    #[error("Purchase error: {0}")]
    Purchase(#[from] fraudshield_purchases::PurchaseError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
