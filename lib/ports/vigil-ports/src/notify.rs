use anyhow::Result;
use async_trait::async_trait;

use vigil_domain::{ComponentType, IncidentSeverity, StatusChange};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Whether a channel actually delivered. Unconfigured channels skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Skipped,
}

#[async_trait]
pub trait MailerPort: Send + Sync {
    fn is_configured(&self) -> bool;
    async fn send(&self, message: &EmailMessage) -> Result<Delivery>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentAnnouncement {
    pub title: String,
    pub severity: IncidentSeverity,
    pub message: String,
    pub affected_components: Vec<ComponentType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    StatusChanges(Vec<StatusChange>),
    Incident(IncidentAnnouncement),
}

/// A chat webhook (Slack, Discord).
#[async_trait]
pub trait ChatPort: Send + Sync {
    fn name(&self) -> &'static str;
    async fn post(&self, event: &ChatEvent) -> Result<Delivery>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullMailer;

#[async_trait]
impl MailerPort for NullMailer {
    fn is_configured(&self) -> bool {
        false
    }

    async fn send(&self, message: &EmailMessage) -> Result<Delivery> {
        tracing::info!("mailer not configured, skipping email to {}", message.to);
        Ok(Delivery::Skipped)
    }
}
