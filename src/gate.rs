//! Gate conditions for poll cycles
//!
//! A gate is an environmental precondition evaluated exactly once per poll
//! cycle, before any target is contacted. When it does not hold, the whole
//! cycle is skipped and the scheduler simply waits for the next interval -
//! no partial progress.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::config::GateConfig;

/// Pluggable cycle precondition
#[async_trait]
pub trait Gate: Send + Sync {
    async fn satisfied(&self) -> bool;
}

/// Gate that always holds - every cycle runs.
pub struct AlwaysOpen;

#[async_trait]
impl Gate for AlwaysOpen {
    async fn satisfied(&self) -> bool {
        true
    }
}

/// Connectivity-probe gate
///
/// Considers the gate satisfied when a HEAD request to the probe URL gets
/// any response at all. This stands in for "right kind of network" checks:
/// point it at an endpoint that is only reachable under the desired
/// conditions.
pub struct HttpProbeGate {
    client: reqwest::Client,
    url: String,
}

impl HttpProbeGate {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to build HTTP client"),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Gate for HttpProbeGate {
    async fn satisfied(&self) -> bool {
        trace!("probing {}", self.url);

        match self.client.head(&self.url).send().await {
            Ok(_) => true,
            Err(e) => {
                debug!("gate probe {} failed: {e}", self.url);
                false
            }
        }
    }
}

/// Build a gate from its config variant.
pub fn gate_from_config(config: &GateConfig) -> Box<dyn Gate> {
    match config {
        GateConfig::Always => Box::new(AlwaysOpen),
        GateConfig::Probe { url } => Box::new(HttpProbeGate::new(url.clone())),
    }
}
