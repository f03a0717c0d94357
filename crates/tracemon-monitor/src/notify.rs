use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Delivers a message to an operator-facing channel.
pub trait Notifier {
    fn send(&self, message: &str) -> Result<()>;
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn send(&self, message: &str) -> Result<()> {
        (**self).send(message)
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Posts `{"content": message}` to a chat webhook.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::blocking::Client,
    endpoint: String,
    code_block: bool,
}

impl WebhookNotifier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build webhook client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            code_block: false,
        })
    }

    /// Wraps each message in a fenced code block.
    pub fn with_code_block(mut self, code_block: bool) -> Self {
        self.code_block = code_block;
        self
    }

    fn render(&self, message: &str) -> String {
        if self.code_block {
            format!("```{message}```")
        } else {
            message.to_string()
        }
    }
}

impl Notifier for WebhookNotifier {
    fn send(&self, message: &str) -> Result<()> {
        let content = self.render(message);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&WebhookPayload { content: &content })
            .send()
            .context("failed to post webhook notification")?;

        let status = response.status();
        debug!(status = status.as_u16(), "webhook notification sent");
        if !status.is_success() {
            return Err(anyhow!("webhook rejected notification with status {status}"));
        }
        Ok(())
    }
}

/// Delivery for runs without a webhook. Messages reach the info log through
/// the coordinator; this adds only a debug line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, message: &str) -> Result<()> {
        debug!(channel = "log", "{message}");
        Ok(())
    }
}
