//! Snapshot publication
//!
//! [`SnapshotStore`] holds the current snapshot behind an `Arc`. Readers take
//! one `Arc` per query and keep using it even while a newer snapshot is
//! published; publication swaps the pointer under a write lock, so updates
//! are linearized and never observed half-applied.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::snapshot::{CorpusSnapshot, CorpusUpdate};

/// Linearizing holder of the current corpus snapshot
#[derive(Debug)]
pub struct SnapshotStore {
    current: RwLock<Arc<CorpusSnapshot>>,
    /// Serializes writers so each update is applied to the latest snapshot
    publish: Mutex<()>,
}

impl SnapshotStore {
    /// Store starting from `snapshot`
    #[must_use]
    pub fn new(snapshot: CorpusSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
            publish: Mutex::new(()),
        }
    }

    /// Store starting from an empty corpus
    #[must_use]
    pub fn empty(as_of: DateTime<Utc>) -> Self {
        Self::new(CorpusSnapshot::empty(as_of))
    }

    /// Current snapshot
    #[inline]
    #[must_use]
    pub fn current(&self) -> Arc<CorpusSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Current version
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.current.read().version()
    }

    /// Apply an update on top of the latest snapshot and publish the result
    ///
    /// The new snapshot is built outside the read/write lock so readers are
    /// only blocked for the pointer swap.
    pub fn publish(&self, update: &CorpusUpdate) -> Arc<CorpusSnapshot> {
        let _writer = self.publish.lock();
        let base = self.current();
        let next = Arc::new(base.apply(update));

        *self.current.write() = Arc::clone(&next);
        debug!(version = next.version(), issues = next.len(), "published corpus snapshot");
        next
    }

    /// Replace the snapshot wholesale (e.g. after a full refetch)
    ///
    /// The replacement is published as the next version whatever version it
    /// was built with.
    pub fn replace(&self, snapshot: CorpusSnapshot) -> Arc<CorpusSnapshot> {
        let _writer = self.publish.lock();
        let version = self.version() + 1;
        let next = Arc::new(snapshot.with_version(version));
        *self.current.write() = Arc::clone(&next);
        debug!(version, issues = next.len(), "replaced corpus snapshot");
        next
    }
}
