use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use vigil_domain::{IncidentSeverity, StatusChange, StatusLevel, worst_new_status};
use vigil_ports::{ChatEvent, ChatPort, Delivery, IncidentAnnouncement};

use crate::{Branding, post_json};

fn status_emoji(status: StatusLevel) -> &'static str {
    match status {
        StatusLevel::Operational => ":white_check_mark:",
        StatusLevel::Degraded => ":warning:",
        StatusLevel::PartialOutage => ":large_orange_diamond:",
        StatusLevel::MajorOutage => ":red_circle:",
    }
}

fn severity_emoji(severity: IncidentSeverity) -> &'static str {
    match severity {
        IncidentSeverity::Critical => ":rotating_light:",
        IncidentSeverity::Major => ":warning:",
        IncidentSeverity::Minor => ":information_source:",
    }
}

/// Slack incoming webhook, Block Kit payloads.
#[derive(Debug, Clone)]
pub struct SlackWebhook {
    client: Client,
    url: String,
    branding: Branding,
}

impl SlackWebhook {
    pub fn new(client: Client, url: impl Into<String>, branding: Branding) -> Self {
        Self {
            client,
            url: url.into(),
            branding,
        }
    }

    fn context_link(&self) -> Value {
        json!({
            "type": "context",
            "elements": [{
                "type": "mrkdwn",
                "text": format!("<{}|View Status Page>", self.branding.url),
            }],
        })
    }

    pub fn status_payload(&self, changes: &[StatusChange]) -> Value {
        let worst = worst_new_status(changes);
        let fields: Vec<Value> = changes
            .iter()
            .map(|change| {
                json!({
                    "type": "mrkdwn",
                    "text": format!(
                        "*{}*\n{} → {} {}",
                        change.component.label(),
                        status_emoji(change.previous_status),
                        status_emoji(change.new_status),
                        change.new_status.label(),
                    ),
                })
            })
            .collect();

        json!({
            "blocks": [
                {
                    "type": "header",
                    "text": {
                        "type": "plain_text",
                        "text": format!("{} {} Update", status_emoji(worst), self.branding.name),
                        "emoji": true,
                    },
                },
                { "type": "section", "fields": fields },
                self.context_link(),
            ],
        })
    }

    pub fn incident_payload(&self, incident: &IncidentAnnouncement) -> Value {
        let affected = incident
            .affected_components
            .iter()
            .map(|component| component.label())
            .collect::<Vec<_>>()
            .join(", ");

        json!({
            "blocks": [
                {
                    "type": "header",
                    "text": {
                        "type": "plain_text",
                        "text": format!("{} Incident: {}", severity_emoji(incident.severity), incident.title),
                        "emoji": true,
                    },
                },
                {
                    "type": "section",
                    "text": { "type": "mrkdwn", "text": incident.message },
                },
                {
                    "type": "section",
                    "fields": [
                        { "type": "mrkdwn", "text": format!("*Severity:*\n{}", incident.severity.label()) },
                        { "type": "mrkdwn", "text": format!("*Affected:*\n{affected}") },
                    ],
                },
                self.context_link(),
            ],
        })
    }
}

#[async_trait]
impl ChatPort for SlackWebhook {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn post(&self, event: &ChatEvent) -> Result<Delivery> {
        let payload = match event {
            ChatEvent::StatusChanges(changes) if changes.is_empty() => return Ok(Delivery::Skipped),
            ChatEvent::StatusChanges(changes) => self.status_payload(changes),
            ChatEvent::Incident(incident) => self.incident_payload(incident),
        };
        post_json(&self.client, &self.url, &payload)
            .await
            .context("slack webhook failed")?;
        Ok(Delivery::Sent)
    }
}
