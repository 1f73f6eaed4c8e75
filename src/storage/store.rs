//! Store trait definition

use async_trait::async_trait;

use super::error::StorageResult;
use crate::{Snapshot, Target};

/// Trait for target and snapshot persistence
///
/// All methods are async for compatibility with Tokio, and implementations
/// must be `Send + Sync` as they are shared across check tasks.
///
/// Errors are returned as typed `StorageError` values; callers decide
/// whether a failure is fatal (for the scheduler it is fatal only to the
/// single check task that hit it).
#[async_trait]
pub trait Store: Send + Sync {
    /// List every known target, sync-enabled or not.
    ///
    /// Called once at the start of each poll cycle.
    async fn list_targets(&self) -> StorageResult<Vec<Target>>;

    /// Insert or replace a target, keyed by its id.
    async fn save_target(&self, target: Target) -> StorageResult<()>;

    /// Append a snapshot to the target's history.
    ///
    /// Returns the persisted record; the scheduler uses it to drive the
    /// notification step.
    async fn save_snapshot(&self, snapshot: Snapshot) -> StorageResult<Snapshot>;

    /// Most recent snapshot for a target, if any.
    async fn latest_snapshot(&self, target_id: &str) -> StorageResult<Option<Snapshot>>;

    /// The N most recent snapshots for a target, newest first.
    async fn snapshot_history(&self, target_id: &str, limit: usize)
    -> StorageResult<Vec<Snapshot>>;
}
