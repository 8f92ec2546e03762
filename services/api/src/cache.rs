//! In-memory bet cache
//!
//! Mirrors the repository's bets in one bucket per [`BetStatus`]. Each bucket
//! holds an immutable snapshot that is replaced whole, so a reader sees either
//! the old or the new collection and never a mix. Refills of one bucket are
//! serialized by that bucket's refill lock; different buckets refill
//! independently.
//!
//! The cache is read-through: an empty or invalidated bucket is loaded from
//! the repository on the next read. A failed refill drops the bucket rather
//! than keeping a snapshot that may miss a committed write.

use std::sync::Arc;

use common::error::DatabaseResult;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    models::{Bet, BetStatus},
    repositories::BetRepository,
};

/// Shared, immutable view of one status bucket
pub type Snapshot = Arc<Vec<Bet>>;

#[derive(Default)]
struct Bucket {
    snapshot: RwLock<Option<Snapshot>>,
    refill: Mutex<()>,
}

impl Bucket {
    fn current(&self) -> Option<Snapshot> {
        self.snapshot.read().clone()
    }

    fn replace(&self, snapshot: Option<Snapshot>) {
        *self.snapshot.write() = snapshot;
    }
}

/// Bet cache keyed by status
pub struct BetCache {
    repository: Arc<dyn BetRepository>,
    buckets: [Bucket; 4],
}

impl BetCache {
    pub fn new(repository: Arc<dyn BetRepository>) -> Self {
        Self {
            repository,
            buckets: std::array::from_fn(|_| Bucket::default()),
        }
    }

    fn bucket(&self, status: BetStatus) -> &Bucket {
        &self.buckets[status.index()]
    }

    /// Bets currently in `status`
    pub async fn list(&self, status: BetStatus) -> DatabaseResult<Snapshot> {
        if let Some(snapshot) = self.bucket(status).current() {
            return Ok(snapshot);
        }

        let bucket = self.bucket(status);
        let _refill = bucket.refill.lock().await;

        // Another reader may have filled it while we waited.
        if let Some(snapshot) = bucket.current() {
            return Ok(snapshot);
        }

        debug!("Bet cache miss for {:?}", status);
        self.load(status, bucket).await
    }

    /// Reload `status` from the repository after a committed mutation
    pub async fn refresh(&self, status: BetStatus) -> DatabaseResult<Snapshot> {
        let bucket = self.bucket(status);
        let _refill = bucket.refill.lock().await;
        self.load(status, bucket).await
    }

    /// Drop the snapshot for `status`; the next read reloads it
    pub fn invalidate(&self, status: BetStatus) {
        self.bucket(status).replace(None);
    }

    /// Load every bucket, typically once at startup
    pub async fn warm(&self) -> DatabaseResult<()> {
        for status in BetStatus::ALL {
            let snapshot = self.refresh(status).await?;
            info!("Bet cache warmed {:?} with {} bets", status, snapshot.len());
        }
        Ok(())
    }

    /// Whether `status` currently holds a snapshot
    pub fn is_loaded(&self, status: BetStatus) -> bool {
        self.bucket(status).current().is_some()
    }

    async fn load(&self, status: BetStatus, bucket: &Bucket) -> DatabaseResult<Snapshot> {
        match self.repository.list_by_status(status).await {
            Ok(bets) => {
                let snapshot = Arc::new(bets);
                bucket.replace(Some(snapshot.clone()));
                Ok(snapshot)
            }
            Err(e) => {
                warn!("Failed to refill bet cache for {:?}: {}", status, e);
                bucket.replace(None);
                Err(e)
            }
        }
    }
}
