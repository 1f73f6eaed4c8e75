//! In-memory store (no persistence)
//!
//! Targets live in a map keyed by id, snapshots in a bounded per-target
//! ring buffer. All data is lost on restart; this is the backend for tests
//! and for deployments that only care about the notification stream.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use super::error::StorageResult;
use super::store::Store;
use crate::{Snapshot, Target};

/// Maximum snapshots retained per target
const MAX_SNAPSHOTS_PER_TARGET: usize = 1000;

/// In-memory store backed by `RwLock`ed maps
///
/// Targets and snapshots are locked independently, so a target upsert never
/// contends with a snapshot append for another target longer than the map
/// access itself.
pub struct MemoryStore {
    targets: RwLock<HashMap<String, Target>>,
    snapshots: RwLock<HashMap<String, VecDeque<Snapshot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            targets: RwLock::new(HashMap::new()),
            snapshots: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store pre-seeded with targets (typically from config).
    pub async fn with_targets(targets: Vec<Target>) -> Self {
        let store = Self::new();
        {
            let mut map = store.targets.write().await;
            for target in targets {
                map.insert(target.id.clone(), target);
            }
        }
        store
    }

    /// Number of snapshots currently retained across all targets.
    pub async fn snapshot_count(&self) -> usize {
        self.snapshots
            .read()
            .await
            .values()
            .map(|history| history.len())
            .sum()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_targets(&self) -> StorageResult<Vec<Target>> {
        let targets = self.targets.read().await;
        trace!("listing {} targets", targets.len());
        Ok(targets.values().cloned().collect())
    }

    async fn save_target(&self, target: Target) -> StorageResult<()> {
        trace!("upserting target {}", target.id);
        self.targets
            .write()
            .await
            .insert(target.id.clone(), target);
        Ok(())
    }

    async fn save_snapshot(&self, snapshot: Snapshot) -> StorageResult<Snapshot> {
        let mut snapshots = self.snapshots.write().await;
        let history = snapshots.entry(snapshot.target_id.clone()).or_default();

        history.push_back(snapshot.clone());
        if history.len() > MAX_SNAPSHOTS_PER_TARGET {
            debug!(
                "snapshot history for {} full, evicting oldest",
                snapshot.target_id
            );
            history.pop_front();
        }

        Ok(snapshot)
    }

    async fn latest_snapshot(&self, target_id: &str) -> StorageResult<Option<Snapshot>> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots
            .get(target_id)
            .and_then(|history| history.back().cloned()))
    }

    async fn snapshot_history(
        &self,
        target_id: &str,
        limit: usize,
    ) -> StorageResult<Vec<Snapshot>> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots
            .get(target_id)
            .map(|history| history.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
