use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use fraudshield_storage::KeyValueStore;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::{
    models::{Alert, PersistedSettings, Settings, Transaction},
    seed, views, Result,
};

/// Key the settings snapshot lives under
pub const DEFAULT_STORAGE_KEY: &str = "fraudshield-state";

/// Dashboard protection score until something real feeds it
pub const DEFAULT_PROTECTION_SCORE: u8 = 94;

/// Everything the store owns
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    /// Newest first
    pub transactions: Vec<Transaction>,
    pub alerts: Vec<Alert>,
    pub settings: Settings,
    pub protection_score: u8,
    unread_alert_count: usize,
}

impl AppState {
    pub fn new(transactions: Vec<Transaction>, alerts: Vec<Alert>) -> Self {
        let mut state = Self {
            transactions,
            alerts,
            settings: Settings::default(),
            protection_score: DEFAULT_PROTECTION_SCORE,
            unread_alert_count: 0,
        };
        state.refresh_unread();
        state
    }

    /// The demo seed the app ships with
    pub fn demo() -> Self {
        Self::new(seed::demo_transactions(), seed::demo_alerts())
    }

    pub fn unread_alert_count(&self) -> usize {
        self.unread_alert_count
    }

    fn refresh_unread(&mut self) {
        self.unread_alert_count = views::count_unread(&self.alerts);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

/// A consistent copy of the store plus the version it was taken at
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSnapshot {
    pub version: u64,
    pub state: AppState,
}

/// Single source of truth for transactions, alerts and settings
///
/// Every action takes the write lock once, so readers never see half of a
/// mutation (say, a new unread count without the flag that caused it).
/// Each change bumps a version counter; `subscribe` hands out a receiver
/// that wakes on every bump.
///
/// Storage calls copy what they need under the lock and then release it
/// before awaiting I/O, so a save racing a later mutation can persist a
/// slightly stale record.
pub struct AppStore {
    state: RwLock<AppState>,
    version: watch::Sender<u64>,
    storage: Arc<dyn KeyValueStore>,
    storage_key: String,
}

impl AppStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self::with_state(storage, AppState::default())
    }

    pub fn with_state(storage: Arc<dyn KeyValueStore>, mut state: AppState) -> Self {
        state.refresh_unread();
        let (version, _) = watch::channel(0);

        Self {
            state: RwLock::new(state),
            version,
            storage,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    fn read(&self) -> RwLockReadGuard<'_, AppState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` under the write lock
    ///
    /// `f` reports whether it changed anything; only then is the unread
    /// count recomputed from the resulting alerts and the version bumped.
    fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut AppState) -> bool,
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let changed = f(&mut *state);
        if changed {
            state.refresh_unread();
            self.version.send_modify(|v| *v += 1);
        }
        changed
    }

    // --- transactions ---

    pub fn transactions(&self) -> Vec<Transaction> {
        self.read().transactions.clone()
    }

    pub fn has_transaction(&self, id: &str) -> bool {
        self.read().transactions.iter().any(|tx| tx.id == id)
    }

    /// Prepend a transaction
    ///
    /// Ids are the caller's responsibility: a duplicate is accepted and
    /// logged, and both entries are kept.
    pub fn add_transaction(&self, tx: Transaction) {
        self.update(|state| {
            if state.transactions.iter().any(|existing| existing.id == tx.id) {
                warn!("Duplicate transaction id {} added", tx.id);
            }
            debug!("Adding transaction {} ({})", tx.id, tx.risk);
            state.transactions.insert(0, tx);
            true
        });
    }

    // --- alerts ---

    pub fn alerts(&self) -> Vec<Alert> {
        self.read().alerts.clone()
    }

    /// Append an alert from the seed or an ingestion feed
    pub fn add_alert(&self, alert: Alert) {
        self.update(|state| {
            if state.alerts.iter().any(|existing| existing.id == alert.id) {
                warn!("Duplicate alert id {} added", alert.id);
            }
            state.alerts.push(alert);
            true
        });
    }

    /// Mark an alert read. Unknown ids and already-read alerts are no-ops.
    ///
    /// Returns true if something flipped.
    pub fn mark_alert_read(&self, id: &str) -> bool {
        let changed = self.update(|state| {
            let mut flipped = false;
            for alert in state.alerts.iter_mut().filter(|a| a.id == id && !a.read) {
                alert.read = true;
                flipped = true;
            }
            flipped
        });

        if !changed {
            debug!("mark_alert_read({}) changed nothing", id);
        }
        changed
    }

    pub fn unread_alert_count(&self) -> usize {
        self.read().unread_alert_count
    }

    // --- settings ---

    pub fn settings(&self) -> Settings {
        self.read().settings
    }

    pub fn is_premium(&self) -> bool {
        self.read().settings.is_premium
    }

    pub fn protection_score(&self) -> u8 {
        self.read().protection_score
    }

    /// Plain overwrite; verifying the purchase is the caller's job
    pub fn set_premium(&self, is_premium: bool) {
        self.update(|state| {
            let changed = state.settings.is_premium != is_premium;
            state.settings.is_premium = is_premium;
            changed
        });
    }

    /// Flip protection; returns the new value
    pub fn toggle_protection(&self) -> bool {
        let mut enabled = false;
        self.update(|state| {
            state.settings.protection_enabled = !state.settings.protection_enabled;
            enabled = state.settings.protection_enabled;
            true
        });
        info!("Protection {}", if enabled { "enabled" } else { "disabled" });
        enabled
    }

    pub fn set_push_notifications(&self, enabled: bool) {
        self.update(|state| {
            let changed = state.settings.push_notifications != enabled;
            state.settings.push_notifications = enabled;
            changed
        });
    }

    pub fn set_email_alerts(&self, enabled: bool) {
        self.update(|state| {
            let changed = state.settings.email_alerts != enabled;
            state.settings.email_alerts = enabled;
            changed
        });
    }

    // --- observation ---

    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.read();
        StoreSnapshot {
            version: *self.version.borrow(),
            state: state.clone(),
        }
    }

    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Receiver that wakes whenever the store changes
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    // --- persistence ---

    /// Merge the persisted settings record onto the current state
    ///
    /// Returns `Ok(false)` when nothing has been persisted yet. A record
    /// that fails to parse leaves the state untouched.
    pub async fn try_load_from_storage(&self) -> Result<bool> {
        let Some(raw) = self.storage.get_item(&self.storage_key).await? else {
            return Ok(false);
        };

        let record: PersistedSettings = serde_json::from_str(&raw)?;
        self.update(|state| {
            let before = state.settings;
            record.apply_to(&mut state.settings);
            state.settings != before
        });

        Ok(true)
    }

    /// Like [`try_load_from_storage`](Self::try_load_from_storage), but never fails
    ///
    /// Missing or unreadable state means "start from defaults".
    pub async fn load_from_storage(&self) {
        match self.try_load_from_storage().await {
            Ok(true) => info!("Loaded persisted settings from {}", self.storage_key),
            Ok(false) => debug!("No persisted settings under {}", self.storage_key),
            Err(e) => warn!("Failed to load state: {}", e),
        }
    }

    /// Write the persisted subset: the four settings flags, nothing else
    pub async fn try_save_to_storage(&self) -> Result<()> {
        let record = PersistedSettings::from(&self.read().settings);
        let json = serde_json::to_string(&record)?;
        self.storage.set_item(&self.storage_key, &json).await?;
        Ok(())
    }

    /// Fire-and-forget save; failures are logged and dropped
    pub async fn save_to_storage(&self) {
        match self.try_save_to_storage().await {
            Ok(()) => debug!("Saved settings to {}", self.storage_key),
            Err(e) => error!("Failed to save state: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertSeverity, RiskLevel};
    use fraudshield_storage::{MemoryStore, StorageError};
    use mockall::predicate::eq;

    mockall::mock! {
        pub Kv {}

        #[async_trait::async_trait]
        impl KeyValueStore for Kv {
            async fn get_item(&self, key: &str) -> fraudshield_storage::Result<Option<String>>;
            async fn set_item(&self, key: &str, value: &str) -> fraudshield_storage::Result<()>;
            async fn remove_item(&self, key: &str) -> fraudshield_storage::Result<()>;
        }
    }

    fn demo_store() -> AppStore {
        AppStore::with_state(Arc::new(MemoryStore::new()), AppState::demo())
    }

    fn disk_full() -> StorageError {
        StorageError::Io(std::io::Error::other("disk full"))
    }

    #[test]
    fn test_demo_seed() {
        let store = demo_store();
        assert_eq!(store.transactions().len(), 3);
        assert_eq!(store.alerts().len(), 2);
        assert_eq!(store.unread_alert_count(), 2);
        assert_eq!(store.protection_score(), 94);
        assert_eq!(store.settings(), Settings::default());
    }

    #[test]
    fn test_add_transaction_prepends() {
        let store = demo_store();
        store.add_transaction(Transaction::new("4", "Uber", "$24.50", "Feb 15", RiskLevel::Low));

        let txs = store.transactions();
        assert_eq!(txs.len(), 4);
        assert_eq!(txs[0].id, "4");
        assert_eq!(txs[1].id, "1");
    }

    #[test]
    fn test_duplicate_transaction_ids_are_kept() {
        let store = demo_store();
        assert!(store.has_transaction("1"));
        store.add_transaction(Transaction::new("1", "Amazon", "$5.00", "Feb 15", RiskLevel::Low));

        let dupes = store.transactions().iter().filter(|t| t.id == "1").count();
        assert_eq!(dupes, 2);
    }

    #[test]
    fn test_marking_last_unread_alert_leaves_zero() {
        let store = demo_store();

        assert!(store.mark_alert_read("1"));
        assert_eq!(store.unread_alert_count(), 1);

        assert!(store.mark_alert_read("2"));
        assert_eq!(store.unread_alert_count(), 0);
    }

    #[test]
    fn test_mark_alert_read_is_idempotent() {
        let store = demo_store();
        store.mark_alert_read("1");
        let after_once = store.snapshot();

        assert!(!store.mark_alert_read("1"));
        let after_twice = store.snapshot();

        assert_eq!(after_once, after_twice);
        assert_eq!(store.unread_alert_count(), 1);
    }

    #[test]
    fn test_mark_alert_read_only_touches_target() {
        let store = demo_store();
        let before = store.alerts();
        store.mark_alert_read("2");
        let after = store.alerts();

        assert_eq!(before[0], after[0]);
        assert!(after[1].read);
        assert_eq!(after[1].title, before[1].title);
    }

    #[test]
    fn test_unknown_alert_id_is_noop() {
        let store = demo_store();
        let before = store.snapshot();

        assert!(!store.mark_alert_read("nonexistent-id"));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_add_alert_updates_unread_count() {
        let store = demo_store();
        store.add_alert(Alert::new("3", AlertSeverity::Low, "Subscription Reminder", "Renews tomorrow"));
        assert_eq!(store.unread_alert_count(), 3);
        assert_eq!(store.alerts().last().map(|a| a.id.as_str()), Some("3"));
    }

    #[test]
    fn test_toggle_protection_twice_restores() {
        let store = demo_store();
        let original = store.settings().protection_enabled;

        assert_eq!(store.toggle_protection(), !original);
        assert_eq!(store.toggle_protection(), original);
        assert_eq!(store.settings().protection_enabled, original);
    }

    #[test]
    fn test_version_bumps_only_on_change() {
        let store = demo_store();
        assert_eq!(store.version(), 0);

        store.set_premium(false);
        store.mark_alert_read("missing");
        assert_eq!(store.version(), 0);

        store.set_premium(true);
        assert_eq!(store.version(), 1);
        store.set_email_alerts(false);
        assert_eq!(store.version(), 2);
        assert_eq!(store.snapshot().version, 2);
    }

    #[tokio::test]
    async fn test_subscribers_wake_on_change() {
        let store = Arc::new(demo_store());
        let mut rx = store.subscribe();

        let writer = Arc::clone(&store);
        tokio::spawn(async move {
            writer.mark_alert_read("1");
        });

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 1);
        assert_eq!(store.unread_alert_count(), 1);
    }

    #[tokio::test]
    async fn test_load_missing_record_keeps_defaults() {
        let store = demo_store();
        assert!(!store.try_load_from_storage().await.unwrap());
        store.load_from_storage().await;
        assert_eq!(store.settings(), Settings::default());
    }

    #[tokio::test]
    async fn test_load_malformed_record_keeps_defaults() {
        let kv = Arc::new(MemoryStore::new());
        kv.set_item(DEFAULT_STORAGE_KEY, "{not json").await.unwrap();
        let store = AppStore::with_state(kv.clone(), AppState::demo());

        assert!(store.try_load_from_storage().await.is_err());
        store.load_from_storage().await;
        assert_eq!(store.settings(), Settings::default());

        kv.set_item(DEFAULT_STORAGE_KEY, r#"{"isPremium":"yes"}"#).await.unwrap();
        store.load_from_storage().await;
        assert!(!store.is_premium());
    }

    #[tokio::test]
    async fn test_load_read_failure_is_swallowed() {
        let mut kv = MockKv::new();
        kv.expect_get_item()
            .with(eq(DEFAULT_STORAGE_KEY))
            .returning(|_| Err(disk_full()));
        let store = AppStore::with_state(Arc::new(kv), AppState::demo());

        store.load_from_storage().await;
        assert_eq!(store.settings(), Settings::default());
    }

    #[tokio::test]
    async fn test_save_writes_only_settings() {
        let mut kv = MockKv::new();
        kv.expect_set_item()
            .withf(|key, value| {
                key == "custom-key"
                    && value
                        == r#"{"protectionEnabled":false,"pushNotifications":true,"emailAlerts":true,"isPremium":true}"#
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let store =
            AppStore::with_state(Arc::new(kv), AppState::demo()).with_storage_key("custom-key");
        store.toggle_protection();
        store.set_premium(true);

        store.try_save_to_storage().await.unwrap();
    }

    #[tokio::test]
    async fn test_save_failure_does_not_propagate() {
        let mut kv = MockKv::new();
        kv.expect_set_item().times(2).returning(|_, _| Err(disk_full()));
        let store = AppStore::with_state(Arc::new(kv), AppState::demo());

        assert!(store.try_save_to_storage().await.is_err());
        store.save_to_storage().await;
        assert_eq!(store.transactions().len(), 3);
    }

    #[tokio::test]
    async fn test_load_merges_partial_record() {
        let kv = Arc::new(MemoryStore::new());
        kv.set_item(DEFAULT_STORAGE_KEY, r#"{"emailAlerts":false}"#)
            .await
            .unwrap();
        let store = AppStore::with_state(kv, AppState::demo());

        assert!(store.try_load_from_storage().await.unwrap());
        let settings = store.settings();
        assert!(!settings.email_alerts);
        assert!(settings.protection_enabled);
        assert!(settings.push_notifications);
        assert!(!settings.is_premium);
        assert_eq!(store.transactions().len(), 3);
    }
}
