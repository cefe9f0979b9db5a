use super::HistoryResult;
use super::HistoryStore;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory history. The write lock is held only for the map insert.
#[derive(Default)]
pub struct MemHistoryStore {
    map: RwLock<HashMap<String, Bytes>>,
}

impl MemHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemHistoryStore {
    async fn swap_raw(
        &self,
        key: &str,
        body: Bytes,
    ) -> HistoryResult<Option<Bytes>> {
        let mut map = self.map.write().await;
        Ok(map.insert(key.to_string(), body))
    }

    async fn get_raw(&self, key: &str) -> HistoryResult<Option<Bytes>> {
        let map = self.map.read().await;
        Ok(map.get(key).cloned())
    }

    async fn list(&self) -> HistoryResult<Vec<String>> {
        Ok(self.map.read().await.keys().cloned().collect())
    }
}
