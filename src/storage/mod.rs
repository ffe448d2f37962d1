mod memory;
mod sqlite;

pub use memory::*;
pub use sqlite::*;

use std::future::Future;

use anyhow::Result;

/// Key under which the serialized wallet collection is stored.
pub const WALLETS_KEY: &str = "wallets";

/// Key under which the serialized transaction collection is stored.
pub const TRANSACTIONS_KEY: &str = "transactions";

/// String key-value persistence used by the store. Implementations only
/// need to hand back exactly what was last written under a key.
pub trait KeyValueStore {
    /// Read the value stored under `key`, or `None` if nothing was written.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send;

    /// Write every `(key, value)` pair as one unit: either all of them are
    /// stored or none are.
    fn set_many(&self, entries: &[(&str, &str)]) -> impl Future<Output = Result<()>> + Send;
}

/// SQL creating the key-value table.
pub const MIGRATION_001_KV_STORE: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;
