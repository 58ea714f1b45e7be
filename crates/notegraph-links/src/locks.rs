//! Per-note write serialization.
//!
//! Link synchronization tears down and rebuilds a note's outgoing links.
//! Two overlapping syncs of the same note would interleave those steps, so
//! every writer of a note's link set holds that note's lock first.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Registry of async mutexes keyed by note id.
///
/// Cloning shares the registry. Entries nobody holds are pruned on the next
/// acquisition.
#[derive(Clone, Default)]
pub struct NoteLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl NoteLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `note_id`'s link set.
    pub async fn lock(&self, note_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.retain(|id, m| *id == note_id || Arc::strong_count(m) > 1);
            map.entry(note_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of notes with a live lock entry.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for NoteLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteLocks").field("entries", &self.len()).finish()
    }
}
