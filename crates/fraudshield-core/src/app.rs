// Builds the store and purchase plumbing from a Config
use std::sync::Arc;

use fraudshield_purchases::{
    PurchaseGateway, PurchaseService, RevenueCatClient, RevenueCatGateway, SandboxGateway,
    StubGateway,
};
use fraudshield_storage::{KeyValueStore, MemoryStore, SqliteStore};
use tracing::{info, warn};

use crate::{
    config::{Config, PurchaseProvider, StorageBackend},
    premium::PremiumManager,
    store::{AppState, AppStore},
    Result,
};

/// Everything a front-end needs, already wired together
#[derive(Clone)]
pub struct App {
    pub store: Arc<AppStore>,
    pub purchases: PurchaseService,
    pub premium: PremiumManager,
}

impl App {
    /// Wire everything up and pull in persisted settings
    ///
    /// A record that can't be read is logged and skipped.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let app = Self::open(config)?;
        app.store.load_from_storage().await;
        Ok(app)
    }

    /// Wire everything up without touching storage yet
    ///
    /// For callers that load with `try_load_from_storage` themselves.
    pub fn open(config: &Config) -> Result<Self> {
        let storage = open_storage(config)?;
        let gateway = build_gateway(config)?;

        let mut state = if config.store.seed_demo_data {
            AppState::demo()
        } else {
            AppState::default()
        };
        state.protection_score = config.store.protection_score;

        let store = Arc::new(
            AppStore::with_state(storage, state).with_storage_key(config.storage.key.clone()),
        );

        let purchases = PurchaseService::new(gateway);
        let premium = PremiumManager::new(Arc::clone(&store), purchases.clone());

        Ok(Self {
            store,
            purchases,
            premium,
        })
    }
}

pub fn open_storage(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    match config.storage.backend {
        StorageBackend::Sqlite => {
            let path = config.state_db_path()?;
            info!("Using SQLite state at {}", path.display());
            Ok(Arc::new(SqliteStore::open(&path)?))
        }
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}

/// Pick the purchase gateway; RevenueCat without a key falls back to the stub
pub fn build_gateway(config: &Config) -> Result<Arc<dyn PurchaseGateway>> {
    let purchases = &config.purchases;

    match purchases.provider {
        PurchaseProvider::Stub => Ok(Arc::new(StubGateway::new())),
        PurchaseProvider::Sandbox => Ok(Arc::new(SandboxGateway::new())),
        PurchaseProvider::RevenueCat => match &purchases.api_key {
            Some(key) => {
                let client = RevenueCatClient::with_base_url(key.clone(), purchases.api_url.clone())?;
                Ok(Arc::new(RevenueCatGateway::new(
                    client,
                    purchases.app_user_id.clone(),
                )))
            }
            None => {
                warn!("RevenueCat selected but no API key configured, purchases disabled");
                Ok(Arc::new(StubGateway::new()))
            }
        },
    }
}
