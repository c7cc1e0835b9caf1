// Core app logic - the state store, the view logic screens share, and the upgrade flow
pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod premium;
pub mod seed;
pub mod store;
pub mod views;

pub use app::App;
pub use config::Config;
pub use error::Error;
pub use models::{Alert, AlertSeverity, PersistedSettings, RiskLevel, Settings, Transaction};
pub use premium::{Plan, PremiumManager};
pub use store::{AppState, AppStore, StoreSnapshot, DEFAULT_STORAGE_KEY};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
