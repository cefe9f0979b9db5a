use super::{HistoryResult, HistoryStore};
use async_trait::async_trait;
use bytes::Bytes;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use tokio::sync::Mutex;
use tracing::debug;

/// History persisted to a single JSON file.
///
/// The map is loaded on first use and rewritten (tmp file + rename) on every
/// mutation, so a swap has reached disk by the time it returns.
pub struct FileHistoryStore {
    path: PathBuf,
    cache: Mutex<Option<HashMap<String, Bytes>>>,
}

impl FileHistoryStore {
    pub fn new<P: AsRef<Path>>(path: P) -> HistoryResult<Self> {
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            cache: Mutex::new(None),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> HistoryResult<HashMap<String, Bytes>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(HashMap::new());
        }
        let bytes = tokio::fs::read(&self.path).await?;
        let map: HashMap<String, Bytes> = serde_json::from_slice(&bytes)?;
        debug!(path = %self.path.display(), keys = map.len(), "history loaded");
        Ok(map)
    }

    async fn save(&self, map: &HashMap<String, Bytes>) -> HistoryResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let bytes = serde_json::to_vec(map)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    async fn swap_raw(
        &self,
        key: &str,
        body: Bytes,
    ) -> HistoryResult<Option<Bytes>> {
        let mut guard = self.cache.lock().await;
        if guard.is_none() {
            *guard = Some(self.load().await?);
        }
        // the cache only changes once the file has been written
        let mut next = guard.clone().unwrap_or_default();
        let prev = next.insert(key.to_string(), body);
        self.save(&next).await?;
        *guard = Some(next);
        Ok(prev)
    }

    async fn get_raw(&self, key: &str) -> HistoryResult<Option<Bytes>> {
        let mut guard = self.cache.lock().await;
        if guard.is_none() {
            *guard = Some(self.load().await?);
        }
        Ok(guard.as_ref().and_then(|m| m.get(key).cloned()))
    }

    async fn list(&self) -> HistoryResult<Vec<String>> {
        let mut guard = self.cache.lock().await;
        if guard.is_none() {
            *guard = Some(self.load().await?);
        }
        Ok(guard
            .as_ref()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default())
    }
}
