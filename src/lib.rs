pub mod config;
pub mod fetch;
pub mod gate;
pub mod notify;
pub mod scheduler;
pub mod storage;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A monitored URL with its sync and notification settings.
///
/// Targets are created and edited by an outer layer (here: seeded from the
/// config file) and read by the scheduler on every poll cycle. After each
/// completed fetch the scheduler writes back `last_checked` and
/// `last_success`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    /// Stable identifier, used as the storage key
    pub id: String,

    /// URL to fetch
    pub url: String,

    /// Whether this target participates in poll cycles
    pub sync_enabled: bool,

    /// Whether a detected change should produce a notification
    pub notify_enabled: bool,

    /// When the last fetch for this target completed
    pub last_checked: Option<DateTime<Utc>>,

    /// Whether the most recent completed fetch returned usable content
    pub last_success: bool,

    /// Optional display title, used in notification summaries
    pub title: Option<String>,
}

impl Target {
    /// Display name for logs and notifications: title if present, else URL.
    pub fn display_name(&self) -> &str {
        match &self.title {
            Some(title) if !title.trim().is_empty() => title,
            _ => &self.url,
        }
    }
}

/// One fetched-content record for a target at a point in time.
///
/// Snapshots are immutable once written and retained as append-only history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Target this snapshot belongs to
    pub target_id: String,

    /// When the content was captured
    pub timestamp: DateTime<Utc>,

    /// Content length in bytes, used by the change predicate
    pub content_len: usize,

    /// Raw fetched content
    pub content: Vec<u8>,
}

impl Snapshot {
    pub fn new(target_id: impl Into<String>, timestamp: DateTime<Utc>, content: Vec<u8>) -> Self {
        Self {
            target_id: target_id.into(),
            timestamp,
            content_len: content.len(),
            content,
        }
    }

    /// Blank content (empty or whitespace-only) marks an unsuccessful fetch
    /// attempt rather than an error.
    pub fn is_blank(&self) -> bool {
        self.content.iter().all(|b| b.is_ascii_whitespace())
    }

    /// Change predicate: byte-count equality is the proxy for "unchanged".
    pub fn same_length_as(&self, other: &Snapshot) -> bool {
        self.content_len == other.content_len
    }
}
