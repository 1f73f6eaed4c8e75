use tracing::trace;

use crate::Target;

/// Top-level configuration for the sitewatch service
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Poll cycle period in seconds
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Monitored targets
    pub targets: Option<Vec<TargetConfig>>,

    /// Gate condition evaluated once per cycle (optional - defaults to always open)
    #[serde(default)]
    pub gate: GateConfig,

    /// Fetch policy (optional - defaults mirror a single attempt with a 30s timeout)
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Notification delivery (optional - defaults to log output)
    #[serde(default)]
    pub notifier: NotifierConfig,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct TargetConfig {
    pub url: String,

    /// Storage key; defaults to the URL when omitted
    pub id: Option<String>,

    pub title: Option<String>,

    #[serde(default = "default_true")]
    pub sync_enabled: bool,

    #[serde(default = "default_true")]
    pub notify_enabled: bool,
}

impl TargetConfig {
    /// Resolve into a fresh target record (never checked yet).
    pub fn into_target(self) -> Target {
        let id = self.id.unwrap_or_else(|| self.url.clone());
        Target {
            id,
            url: self.url,
            sync_enabled: self.sync_enabled,
            notify_enabled: self.notify_enabled,
            last_checked: None,
            last_success: false,
            title: self.title,
        }
    }
}

/// Gate condition configuration
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GateConfig {
    /// Every cycle runs
    #[default]
    Always,

    /// Cycle runs only when a probe URL answers (connectivity check)
    Probe { url: String },
}

/// Fetch policy configuration
///
/// Retries default to zero: a failed fetch simply waits for the next cycle.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Additional attempts after a transport failure within the same check
    #[serde(default)]
    pub retries: u32,

    /// Fixed delay between retry attempts
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            retries: 0,
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

/// Notification delivery configuration
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NotifierConfig {
    /// Log-only delivery
    #[default]
    Log,

    /// JSON POST to a webhook endpoint
    Webhook { url: String },
}

fn default_interval_secs() -> u64 {
    300
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_delay_secs() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|_| anyhow::anyhow!("Invalid configuration file provided!"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
