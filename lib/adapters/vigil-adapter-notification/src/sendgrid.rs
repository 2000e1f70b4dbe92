use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, info};

use vigil_domain::NotificationsConfig;
use vigil_ports::{Delivery, EmailMessage, MailerPort};

/// SendGrid v3 mail send. Without an API key every send is skipped.
#[derive(Debug, Clone)]
pub struct SendGridMailer {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
    from_email: String,
    from_name: String,
}

impl SendGridMailer {
    pub fn new(client: Client, config: &NotificationsConfig) -> Self {
        Self {
            client,
            api_key: config
                .sendgrid_api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            endpoint: config.sendgrid_url.clone(),
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
        }
    }

    fn payload(&self, message: &EmailMessage) -> Value {
        json!({
            "personalizations": [{ "to": [{ "email": message.to }] }],
            "from": { "email": self.from_email, "name": self.from_name },
            "subject": message.subject,
            "content": [
                { "type": "text/plain", "value": message.text },
                { "type": "text/html", "value": message.html },
            ],
        })
    }
}

#[async_trait]
impl MailerPort for SendGridMailer {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn send(&self, message: &EmailMessage) -> Result<Delivery> {
        let Some(api_key) = &self.api_key else {
            info!("sendgrid api key not configured, skipping email to {}", message.to);
            return Ok(Delivery::Skipped);
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&self.payload(message))
            .send()
            .await
            .context("sendgrid request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("sendgrid returned {status}: {body}");
        }
        debug!(to = %message.to, "email sent");
        Ok(Delivery::Sent)
    }
}
