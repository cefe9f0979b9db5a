//! Per-target payload history.
//!
//! Holds the last raw payload seen for every target. The evaluator owns a
//! store and uses `swap_raw` to read the previous payload and record the new
//! one in a single step.

use async_trait::async_trait;
use bytes::Bytes;

mod errors;
mod file_store;
mod mem_store;

pub use errors::{HistoryError, HistoryResult};
pub use file_store::FileHistoryStore;
pub use mem_store::MemHistoryStore;

/// Last-payload storage keyed by target.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Store `body` under `key` and return what was there before.
    ///
    /// Linearizable per key: two concurrent swaps on the same key never both
    /// observe `None`, and no write is lost. Swaps on different keys are not
    /// ordered relative to each other.
    async fn swap_raw(
        &self,
        key: &str,
        body: Bytes,
    ) -> HistoryResult<Option<Bytes>>;

    /// Read the stored payload without replacing it.
    async fn get_raw(&self, key: &str) -> HistoryResult<Option<Bytes>>;

    /// All keys with a stored payload.
    async fn list(&self) -> HistoryResult<Vec<String>>;
}
