use crate::Result;

/// Async string-to-string storage
///
/// Mirrors the tiny surface a mobile key-value store exposes: get, set,
/// remove. Values are opaque to the store; callers serialize them.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` when nothing was ever written under `key`
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Overwrites whatever was stored under `key`
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error
    async fn remove_item(&self, key: &str) -> Result<()>;
}
