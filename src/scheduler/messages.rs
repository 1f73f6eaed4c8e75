//! Message types for the poll scheduler
//!
//! Commands travel over an mpsc channel to the scheduler; per-check results
//! are broadcast to any interested subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Event published after every check task finishes
///
/// Broadcast to all subscribers (observers, tests, future UI). The channel
/// may lag or drop events for slow subscribers - acceptable, since storage
/// already holds the authoritative record.
#[derive(Debug, Clone)]
pub struct CheckEvent {
    /// Target identifier
    pub target_id: String,

    /// Target URL
    pub url: String,

    /// When the check finished
    pub timestamp: DateTime<Utc>,

    /// What happened
    pub outcome: CheckOutcome,
}

/// Terminal state of a single check task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum CheckOutcome {
    /// The fetch completed and a snapshot was recorded
    Completed {
        /// False when the body was blank (empty/whitespace-only)
        success: bool,

        /// Whether the change predicate fired against the prior snapshot
        changed: bool,

        /// Whether a notification was delivered
        notified: bool,
    },

    /// The fetch never completed; no snapshot, target left untouched
    TransportError { message: String },

    /// A storage write failed; the task was abandoned
    StorageError { message: String },
}

/// Commands that can be sent to the poll scheduler
#[derive(Debug)]
pub enum SchedulerCommand {
    /// Run a cycle immediately (bypassing the interval timer) and await all
    /// in-flight check tasks.
    ///
    /// Used for testing and manual refresh operations.
    CycleNow {
        /// Channel to send the result back
        respond_to: oneshot::Sender<anyhow::Result<CycleStats>>,
    },

    /// Update the cycle interval
    ///
    /// The new interval takes effect immediately by re-arming the ticker.
    UpdateInterval {
        /// New interval in seconds
        interval_secs: u64,
    },

    /// Gracefully shut down the scheduler
    ///
    /// Already dispatched check tasks run to completion first.
    Shutdown,
}

/// Summary of one poll cycle
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleStats {
    /// Whether the gate held; false means the cycle was skipped entirely
    pub gate_satisfied: bool,

    /// Check tasks dispatched this cycle
    pub dispatched: usize,

    /// Check tasks awaited to completion (only populated by `CycleNow`)
    pub completed: usize,
}
