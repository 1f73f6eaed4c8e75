//! User-facing change notifications
//!
//! Delivery is behind the [`Notifier`] trait; the scheduler only decides
//! *whether* to notify. Shipped sinks: structured log output and a generic
//! JSON webhook.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info};

use crate::Target;
use crate::config::NotifierConfig;

/// Notification sink
///
/// Delivery failures are the sink's problem: they are logged and never
/// propagate into the check task that triggered them.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, body: &str);
}

/// Build the human-readable summary for a changed target.
///
/// Title goes into the headline when present, the URL is always the body.
pub fn change_summary(target: &Target) -> (String, String) {
    let title = match &target.title {
        Some(title) if !title.trim().is_empty() => format!("Change detected on {title}!"),
        _ => "Change detected!".to_string(),
    };

    (title, target.url.clone())
}

/// Log-only notification sink
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, title: &str, body: &str) {
        info!("{title} ({body})");
    }
}

#[derive(Debug, Clone, Serialize)]
struct WebhookPayload<'a> {
    title: &'a str,
    body: &'a str,
}

/// Webhook notification sink
///
/// POSTs `{"title": ..., "body": ...}` to the configured endpoint.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, title: &str, body: &str) {
        let payload = WebhookPayload { title, body };

        let result = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .and_then(|response| response.error_for_status());

        match result {
            Ok(_) => info!("delivered notification to webhook: {title}"),
            Err(e) => error!("failed to deliver notification to webhook: {e}"),
        }
    }
}

/// Build a notifier from its config variant.
pub fn notifier_from_config(config: &NotifierConfig) -> Box<dyn Notifier> {
    match config {
        NotifierConfig::Log => Box::new(LogNotifier),
        NotifierConfig::Webhook { url } => Box::new(WebhookNotifier::new(url.clone())),
    }
}
