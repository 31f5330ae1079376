//! Notification sink
//!
//! Fire-and-forget delivery of operational events. The core never depends
//! on delivery success.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::utils::config::NotificationConfig;

/// Notification priority levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyPriority {
    Info,
    Warning,
    Critical,
}

/// Outbound notification channel
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver a notification; failures are the sink's problem, not the caller's
    async fn send(&self, priority: NotifyPriority, title: &str, message: &str, data: Value);
}

/// Sink that writes notifications to the log stream
#[derive(Debug, Default)]
pub struct TracingSink;

#[async_trait]
impl NotificationSink for TracingSink {
    async fn send(&self, priority: NotifyPriority, title: &str, message: &str, data: Value) {
        match priority {
            NotifyPriority::Info => {
                info!(title = title, message = message, data = %data, "Notification")
            }
            NotifyPriority::Warning | NotifyPriority::Critical => {
                warn!(title = title, message = message, data = %data, "Notification")
            }
        }
    }
}

/// Sink that POSTs notifications to a webhook endpoint
#[derive(Debug)]
pub struct WebhookSink {
    http: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(config: &NotificationConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: config.webhook_url.clone(),
        }
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn send(&self, priority: NotifyPriority, title: &str, message: &str, data: Value) {
        let payload = serde_json::json!({
            "priority": format!("{priority:?}"),
            "title": title,
            "message": message,
            "data": data,
        });

        if let Err(e) = self.http.post(&self.url).json(&payload).send().await {
            warn!(error = %e, "Webhook notification delivery failed");
        }
    }
}
