//! Test doubles for the outbound ports.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use vigil_domain::{ComponentType, ProbeOutcome, ProbeRequest, Subscriber};
use vigil_ports::{ChatEvent, ChatPort, Delivery, EmailMessage, MailerPort, ProbePort};

/// Answers probes by path; unscripted paths get a fast healthy 200.
pub struct ScriptedProbe {
    outcomes: HashMap<&'static str, ProbeOutcome>,
}

impl ScriptedProbe {
    pub fn healthy() -> Self {
        Self {
            outcomes: HashMap::new(),
        }
    }

    pub fn with(mut self, path: &'static str, outcome: ProbeOutcome) -> Self {
        self.outcomes.insert(path, outcome);
        self
    }
}

#[async_trait]
impl ProbePort for ScriptedProbe {
    async fn probe(&self, request: ProbeRequest) -> ProbeOutcome {
        self.outcomes
            .get(request.path)
            .cloned()
            .unwrap_or(ProbeOutcome::Response {
                status_code: 200,
                elapsed_ms: 25,
                body: Some(json!({ "status": "ok" })),
            })
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    fail: bool,
    unconfigured: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            unconfigured: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailerPort for RecordingMailer {
    fn is_configured(&self) -> bool {
        !self.unconfigured
    }

    async fn send(&self, message: &EmailMessage) -> Result<Delivery> {
        if self.fail {
            bail!("smtp exploded");
        }
        if self.unconfigured {
            return Ok(Delivery::Skipped);
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(Delivery::Sent)
    }
}

pub struct RecordingChat {
    name: &'static str,
    events: Mutex<Vec<ChatEvent>>,
}

impl RecordingChat {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<ChatEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatPort for RecordingChat {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn post(&self, event: &ChatEvent) -> Result<Delivery> {
        self.events.lock().unwrap().push(event.clone());
        Ok(Delivery::Sent)
    }
}

pub fn verified_subscriber(email: &str, components: Vec<ComponentType>) -> Subscriber {
    let mut subscriber = Subscriber::pending(
        uuid::Uuid::new_v4().to_string(),
        email.to_string(),
        components,
        format!("verify-{email}"),
        format!("unsub-{email}"),
        Utc::now(),
    );
    subscriber.verify(Utc::now());
    subscriber
}
