use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};

use super::KeyValueStore;

/// In-process key-value store. Clones share the same underlying map, so a
/// second handle can observe what a store persisted through the first.
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a key directly, bypassing any store.
    pub fn with_entry(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.into(), value.into());
        }
        self
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn write_all(&self, batch: &[(&str, &str)]) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        for (key, value) in batch {
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.read(key)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.write(key, value)
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        self.write_all(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_key() {
        let kv = MemoryKv::new();
        assert_eq!(kv.get("wallets").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites_and_clones_share_state() {
        let kv = MemoryKv::new();
        let other = kv.clone();

        kv.set("wallets", "[]").await.unwrap();
        kv.set("wallets", "[1]").await.unwrap();

        assert_eq!(other.get("wallets").await.unwrap().as_deref(), Some("[1]"));
    }

    #[tokio::test]
    async fn test_set_many_writes_every_key() {
        let kv = MemoryKv::new().with_entry("wallets", "old");
        kv.set_many(&[("wallets", "[]"), ("transactions", "[]")])
            .await
            .unwrap();

        assert_eq!(kv.get("wallets").await.unwrap().as_deref(), Some("[]"));
        assert_eq!(kv.get("transactions").await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_with_entry_seeds_value() {
        let kv = MemoryKv::new().with_entry("transactions", "not json");
        assert_eq!(
            kv.get("transactions").await.unwrap().as_deref(),
            Some("not json")
        );
    }
}
