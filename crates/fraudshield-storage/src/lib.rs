// Durable key-value persistence for the app's settings snapshot
// Think AsyncStorage, but with SQLite underneath

pub mod error;
pub mod kv;
pub mod memory;
pub mod sqlite;

pub use error::{Result, StorageError};
pub use kv::KeyValueStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
