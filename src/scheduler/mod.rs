//! Poll scheduler
//!
//! The scheduler runs as an independent async task communicating via Tokio
//! channels, owned through a cloneable handle.
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → gate check → dispatch one check task per sync-enabled target
//!     ↑                          │
//!     │                          ├─ fetch → snapshot → target update → notify?
//!     │                          └─ publish CheckEvent (broadcast)
//!     └─── Commands (CycleNow, UpdateInterval, Shutdown)
//! ```
//!
//! Check tasks are isolated: one target's failure never blocks or fails
//! another's. The cycle itself completes after dispatch; the actor reaps
//! task completions in the background and drains them on shutdown or when a
//! `CycleNow` caller wants to await a full cycle.

pub mod messages;
pub mod poller;

pub use messages::{CheckEvent, CheckOutcome, CycleStats, SchedulerCommand};
pub use poller::{PollScheduler, SchedulerDeps, SchedulerHandle, should_notify};
