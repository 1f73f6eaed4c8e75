//! Storage seam for targets and snapshots
//!
//! The scheduler never talks to a concrete backend directly; everything goes
//! through the [`Store`] trait so the persistence layer stays swappable.
//!
//! ## Guarantees implementations must uphold
//!
//! - Writes to different targets are independent: a failing or concurrent
//!   write for target A never affects target B's records.
//! - A write to one target's record is atomic - fully applied or not at all.
//! - Snapshot history is append-only; saved snapshots are never mutated.
//!
//! No cross-target ordering or consistency is required.

pub mod error;
pub mod memory;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use store::Store;
