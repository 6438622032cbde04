//! Once-only lazy model holder.
//!
//! Concurrent first callers all wait on a single load; a failed load leaves
//! the holder empty so the next request tries again.

use crate::embeddings::provider::EmbeddingError;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Holds a model that is loaded on first use and never reloaded.
pub struct LazyModel<T> {
    cell: OnceCell<Arc<T>>,
    load_attempts: AtomicUsize,
}

impl<T> LazyModel<T> {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
            load_attempts: AtomicUsize::new(0),
        }
    }

    /// Return the loaded model, running `load` if nothing is loaded yet.
    ///
    /// At most one `load` runs at a time; callers arriving during a load
    /// wait for its result.
    pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<Arc<T>, EmbeddingError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, EmbeddingError>>,
    {
        let model = self
            .cell
            .get_or_try_init(|| async {
                self.load_attempts.fetch_add(1, Ordering::SeqCst);
                load().await.map(Arc::new)
            })
            .await?;

        Ok(Arc::clone(model))
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Number of times a load has been started.
    pub fn load_attempts(&self) -> usize {
        self.load_attempts.load(Ordering::SeqCst)
    }
}

impl<T> Default for LazyModel<T> {
    fn default() -> Self {
        Self::new()
    }
}
