use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use tracing::{error, info, warn};

use vigil_domain::{ComponentType, StatusChange, Subscriber};
use vigil_ports::{ChatEvent, ChatPort, Delivery, EmailMessage, IncidentAnnouncement, MailerPort, StoragePort};

/// Public identity of the status page, used in every outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteInfo {
    pub name: String,
    pub url: String,
}

impl SiteInfo {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn verify_url(&self, token: &str) -> String {
        format!("{}/api/subscribe/verify?token={token}", self.url)
    }

    pub fn unsubscribe_url(&self, token: &str) -> String {
        format!("{}/api/subscribe/unsubscribe?token={token}", self.url)
    }
}

/// Counts from one fan-out, mostly for logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOut {
    pub emails_sent: usize,
    pub emails_failed: usize,
    pub chats_sent: usize,
}

/// Fans events out to subscribers and chat webhooks. Delivery is best
/// effort: failures are logged and counted, never returned.
#[derive(Clone)]
pub struct NotificationService {
    storage: Arc<dyn StoragePort>,
    mailer: Arc<dyn MailerPort>,
    chats: Vec<Arc<dyn ChatPort>>,
    site: SiteInfo,
}

impl NotificationService {
    pub fn new(
        storage: Arc<dyn StoragePort>,
        mailer: Arc<dyn MailerPort>,
        chats: Vec<Arc<dyn ChatPort>>,
        site: SiteInfo,
    ) -> Self {
        Self {
            storage,
            mailer,
            chats,
            site,
        }
    }

    pub fn site(&self) -> &SiteInfo {
        &self.site
    }

    pub fn mailer_configured(&self) -> bool {
        self.mailer.is_configured()
    }

    pub async fn send_verification(&self, email: &str, token: &str) -> Result<Delivery> {
        let message = verification_email(&self.site, email, token);
        self.mailer.send(&message).await
    }

    pub async fn notify_status_change(&self, changes: &[StatusChange]) -> FanOut {
        if changes.is_empty() {
            return FanOut::default();
        }

        let mut fan_out = FanOut::default();
        for subscriber in self.verified_subscribers().await {
            let relevant: Vec<StatusChange> = changes
                .iter()
                .filter(|change| subscriber.wants(change.component))
                .copied()
                .collect();
            if relevant.is_empty() {
                continue;
            }
            let message = status_change_email(&self.site, &subscriber, &relevant);
            self.deliver(&message, &mut fan_out).await;
        }

        fan_out.chats_sent = self
            .post_to_chats(&ChatEvent::StatusChanges(changes.to_vec()))
            .await;
        info!(
            changes = changes.len(),
            emails = fan_out.emails_sent,
            chats = fan_out.chats_sent,
            "status change notifications sent"
        );
        fan_out
    }

    pub async fn notify_incident(&self, announcement: &IncidentAnnouncement) -> FanOut {
        let mut fan_out = FanOut::default();
        for subscriber in self.verified_subscribers().await {
            if !subscriber.wants_any(&announcement.affected_components) {
                continue;
            }
            let message = incident_email(&self.site, &subscriber, announcement);
            self.deliver(&message, &mut fan_out).await;
        }

        fan_out.chats_sent = self
            .post_to_chats(&ChatEvent::Incident(announcement.clone()))
            .await;
        info!(
            title = %announcement.title,
            emails = fan_out.emails_sent,
            chats = fan_out.chats_sent,
            "incident notifications sent"
        );
        fan_out
    }

    async fn verified_subscribers(&self) -> Vec<Subscriber> {
        match self.storage.verified_subscribers().await {
            Ok(subscribers) => {
                if subscribers.is_empty() {
                    info!("no verified subscribers to notify");
                }
                subscribers
            }
            Err(e) => {
                error!("failed to load subscribers: {e:#}");
                Vec::new()
            }
        }
    }

    async fn deliver(&self, message: &EmailMessage, fan_out: &mut FanOut) {
        match self.mailer.send(message).await {
            Ok(Delivery::Sent) => fan_out.emails_sent += 1,
            Ok(Delivery::Skipped) => {}
            Err(e) => {
                fan_out.emails_failed += 1;
                warn!("failed to send email to {}: {e:#}", message.to);
            }
        }
    }

    async fn post_to_chats(&self, event: &ChatEvent) -> usize {
        let outcomes = join_all(self.chats.iter().map(|chat| async move {
            (chat.name(), chat.post(event).await)
        }))
        .await;

        outcomes
            .into_iter()
            .filter(|(name, outcome)| match outcome {
                Ok(delivery) => *delivery == Delivery::Sent,
                Err(e) => {
                    warn!("{name} webhook failed: {e:#}");
                    false
                }
            })
            .count()
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn component_list(components: &[ComponentType]) -> String {
    components
        .iter()
        .map(|component| component.label())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn verification_email(site: &SiteInfo, email: &str, token: &str) -> EmailMessage {
    let verify_url = site.verify_url(token);
    let name = escape_html(&site.name);
    let html = format!(
        r#"<div style="font-family: sans-serif; max-width: 600px; margin: 0 auto;">
  <h2>Verify your email</h2>
  <p>Thank you for subscribing to {name} updates!</p>
  <p>Please click the link below to verify your email address:</p>
  <p style="margin: 24px 0;"><a href="{verify_url}">Verify Email</a></p>
  <p style="color: #666; font-size: 14px;">Or copy this link: {verify_url}</p>
  <p style="color: #999; font-size: 12px;">If you didn't subscribe to {name}, you can safely ignore this email.</p>
</div>"#
    );
    let text = format!(
        "Verify your email\n\n\
         Thank you for subscribing to {site} updates!\n\n\
         Please click the link below to verify your email address:\n{verify_url}\n\n\
         If you didn't subscribe to {site}, you can safely ignore this email.\n",
        site = site.name
    );
    EmailMessage {
        to: email.to_string(),
        subject: format!("Verify your {} subscription", site.name),
        html,
        text,
    }
}

pub fn status_change_subject(site: &SiteInfo, changes: &[StatusChange]) -> String {
    match changes {
        [change] => format!(
            "{}: {} is {}",
            site.name,
            change.component.label(),
            change.new_status.label()
        ),
        _ => format!("{}: Multiple component status changes", site.name),
    }
}

pub fn status_change_email(
    site: &SiteInfo,
    subscriber: &Subscriber,
    changes: &[StatusChange],
) -> EmailMessage {
    let unsubscribe_url = site.unsubscribe_url(&subscriber.unsubscribe_token);
    let rows: String = changes
        .iter()
        .map(|c| {
            format!(
                "<tr><td style=\"padding: 8px;\"><strong>{}</strong></td>\
                 <td style=\"padding: 8px;\">{} → {}</td></tr>",
                c.component.label(),
                c.previous_status.label(),
                c.new_status.label()
            )
        })
        .collect();
    let lines = changes
        .iter()
        .map(|c| {
            format!(
                "{}: {} → {}",
                c.component.label(),
                c.previous_status.label(),
                c.new_status.label()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let html = format!(
        r#"<div style="font-family: sans-serif; max-width: 600px; margin: 0 auto;">
  <h2>{name} Update</h2>
  <p>The following component status changes have been detected:</p>
  <table style="width: 100%; border-collapse: collapse; margin: 16px 0;">
    <thead><tr><th style="text-align: left;">Component</th><th style="text-align: left;">Status Change</th></tr></thead>
    <tbody>{rows}</tbody>
  </table>
  <p><a href="{url}">View full status page →</a></p>
  <p style="color: #999; font-size: 12px;"><a href="{unsubscribe_url}">Unsubscribe</a> from status updates</p>
</div>"#,
        name = escape_html(&site.name),
        url = site.url,
    );
    let text = format!(
        "{name} Update\n\n\
         The following component status changes have been detected:\n\n\
         {lines}\n\n\
         View full status page: {url}\n\n\
         ---\nTo unsubscribe: {unsubscribe_url}\n",
        name = site.name,
        url = site.url,
    );

    EmailMessage {
        to: subscriber.email.clone(),
        subject: status_change_subject(site, changes),
        html,
        text,
    }
}

pub fn incident_email(
    site: &SiteInfo,
    subscriber: &Subscriber,
    announcement: &IncidentAnnouncement,
) -> EmailMessage {
    let unsubscribe_url = site.unsubscribe_url(&subscriber.unsubscribe_token);
    let affected = component_list(&announcement.affected_components);
    let html = format!(
        r#"<div style="font-family: sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #DD4124;">Incident Report</h2>
  <h3>{title}</h3>
  <p><strong>Severity:</strong> {severity}</p>
  <p><strong>Affected Components:</strong> {affected}</p>
  <p>{message}</p>
  <p style="margin-top: 24px;"><a href="{url}">View status page for updates →</a></p>
  <p style="color: #999; font-size: 12px;"><a href="{unsubscribe_url}">Unsubscribe</a></p>
</div>"#,
        title = escape_html(&announcement.title),
        severity = announcement.severity,
        message = escape_html(&announcement.message),
        url = site.url,
    );
    let text = format!(
        "Incident Report: {title}\n\n\
         Severity: {severity}\n\
         Affected Components: {affected}\n\n\
         {message}\n\n\
         View status page for updates: {url}\n\n\
         ---\nTo unsubscribe: {unsubscribe_url}\n",
        title = announcement.title,
        severity = announcement.severity,
        message = announcement.message,
        url = site.url,
    );

    EmailMessage {
        to: subscriber.email.clone(),
        subject: format!("{} Incident: {}", site.name, announcement.title),
        html,
        text,
    }
}
