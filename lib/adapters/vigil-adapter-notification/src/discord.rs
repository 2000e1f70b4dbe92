use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::Client;
use serde_json::{Value, json};

use vigil_domain::{IncidentSeverity, StatusChange, StatusLevel, worst_new_status};
use vigil_ports::{ChatEvent, ChatPort, Delivery, IncidentAnnouncement};

use crate::{Branding, post_json, status_color};

fn status_emoji(status: StatusLevel) -> &'static str {
    match status {
        StatusLevel::Operational => "✅",
        StatusLevel::Degraded => "⚠️",
        StatusLevel::PartialOutage => "🟠",
        StatusLevel::MajorOutage => "🔴",
    }
}

fn severity_style(severity: IncidentSeverity) -> (&'static str, u32) {
    match severity {
        IncidentSeverity::Critical => ("🚨", status_color(StatusLevel::MajorOutage)),
        IncidentSeverity::Major => ("⚠️", status_color(StatusLevel::PartialOutage)),
        IncidentSeverity::Minor => ("ℹ️", status_color(StatusLevel::Degraded)),
    }
}

/// Discord webhook, one embed per message.
#[derive(Debug, Clone)]
pub struct DiscordWebhook {
    client: Client,
    url: String,
    branding: Branding,
}

impl DiscordWebhook {
    pub fn new(client: Client, url: impl Into<String>, branding: Branding) -> Self {
        Self {
            client,
            url: url.into(),
            branding,
        }
    }

    pub fn status_payload(&self, changes: &[StatusChange]) -> Value {
        let worst = worst_new_status(changes);
        let fields: Vec<Value> = changes
            .iter()
            .map(|change| {
                json!({
                    "name": change.component.label(),
                    "value": format!(
                        "{} → {} {}",
                        status_emoji(change.previous_status),
                        status_emoji(change.new_status),
                        change.new_status.label(),
                    ),
                    "inline": true,
                })
            })
            .collect();

        json!({
            "embeds": [{
                "title": format!("{} {} Update", status_emoji(worst), self.branding.name),
                "url": self.branding.url,
                "color": status_color(worst),
                "fields": fields,
                "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                "footer": { "text": self.branding.name },
            }],
        })
    }

    pub fn incident_payload(&self, incident: &IncidentAnnouncement) -> Value {
        let (emoji, color) = severity_style(incident.severity);
        let affected = incident
            .affected_components
            .iter()
            .map(|component| component.label())
            .collect::<Vec<_>>()
            .join(", ");

        json!({
            "embeds": [{
                "title": format!("{emoji} Incident: {}", incident.title),
                "url": self.branding.url,
                "description": incident.message,
                "color": color,
                "fields": [
                    { "name": "Severity", "value": incident.severity.label(), "inline": true },
                    { "name": "Affected Components", "value": affected, "inline": true },
                ],
                "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                "footer": { "text": self.branding.name },
            }],
        })
    }
}

#[async_trait]
impl ChatPort for DiscordWebhook {
    fn name(&self) -> &'static str {
        "discord"
    }

    async fn post(&self, event: &ChatEvent) -> Result<Delivery> {
        let payload = match event {
            ChatEvent::StatusChanges(changes) if changes.is_empty() => return Ok(Delivery::Skipped),
            ChatEvent::StatusChanges(changes) => self.status_payload(changes),
            ChatEvent::Incident(incident) => self.incident_payload(incident),
        };
        post_json(&self.client, &self.url, &payload)
            .await
            .context("discord webhook failed")?;
        Ok(Delivery::Sent)
    }
}
