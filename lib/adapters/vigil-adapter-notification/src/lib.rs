//! Outbound notification channels: SendGrid email, Slack and Discord
//! webhooks.

mod discord;
mod sendgrid;
mod slack;

use std::sync::Arc;

use anyhow::Result;
use reqwest::Client;

use vigil_domain::{NotificationsConfig, StatusLevel};
use vigil_ports::ChatPort;

pub use discord::DiscordWebhook;
pub use sendgrid::SendGridMailer;
pub use slack::SlackWebhook;

/// Site name and link shown in chat messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branding {
    pub name: String,
    pub url: String,
}

impl Branding {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Chat channels with a configured webhook URL.
pub fn chat_channels(
    client: &Client,
    config: &NotificationsConfig,
    branding: &Branding,
) -> Vec<Arc<dyn ChatPort>> {
    let mut channels: Vec<Arc<dyn ChatPort>> = Vec::new();
    if let Some(url) = non_empty(config.slack_webhook_url.as_deref()) {
        channels.push(Arc::new(SlackWebhook::new(client.clone(), url, branding.clone())));
    }
    if let Some(url) = non_empty(config.discord_webhook_url.as_deref()) {
        channels.push(Arc::new(DiscordWebhook::new(client.clone(), url, branding.clone())));
    }
    channels
}

pub fn http_client() -> Result<Client> {
    Ok(Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Status colors shared by the Discord embeds.
pub(crate) fn status_color(status: StatusLevel) -> u32 {
    match status {
        StatusLevel::Operational => 0x22c55e,
        StatusLevel::Degraded => 0xeab308,
        StatusLevel::PartialOutage => 0xf97316,
        StatusLevel::MajorOutage => 0xef4444,
    }
}

pub(crate) async fn post_json(client: &Client, url: &str, payload: &serde_json::Value) -> Result<()> {
    let response = client.post(url).json(payload).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("webhook returned {status}: {body}");
    }
    Ok(())
}
