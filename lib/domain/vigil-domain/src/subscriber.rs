use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{VigilError, VigilResult};
use crate::status::ComponentType;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap()
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub id: String,
    /// Lowercased, unique.
    pub email: String,
    pub verified: bool,
    pub verification_token: Option<String>,
    pub unsubscribe_token: String,
    /// Empty means every component.
    pub components: Vec<ComponentType>,
    pub created_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl Subscriber {
    pub fn pending(
        id: String,
        email: String,
        components: Vec<ComponentType>,
        verification_token: String,
        unsubscribe_token: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            verified: false,
            verification_token: Some(verification_token),
            unsubscribe_token,
            components,
            created_at: now,
            verified_at: None,
        }
    }

    pub fn verify(&mut self, now: DateTime<Utc>) {
        self.verified = true;
        self.verified_at = Some(now);
        self.verification_token = None;
    }

    pub fn wants(&self, component: ComponentType) -> bool {
        self.components.is_empty() || self.components.contains(&component)
    }

    pub fn wants_any(&self, components: &[ComponentType]) -> bool {
        self.components.is_empty() || components.iter().any(|c| self.components.contains(c))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscribeRequest {
    pub email: Option<String>,
    #[serde(default)]
    pub components: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSubscription {
    pub email: String,
    pub components: Vec<ComponentType>,
}

impl SubscribeRequest {
    pub fn validate(self) -> VigilResult<NewSubscription> {
        let email = self
            .email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty())
            .ok_or_else(|| VigilError::validation("Email is required"))?;
        if !is_valid_email(&email) {
            return Err(VigilError::validation("Invalid email address"));
        }
        let mut components = Vec::new();
        for raw in self.components {
            let component: ComponentType = raw.parse()?;
            if !components.contains(&component) {
                components.push(component);
            }
        }
        Ok(NewSubscription {
            email: email.to_lowercase(),
            components,
        })
    }
}

/// Token-carrying body for the POST variants of verify and unsubscribe.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    pub token: Option<String>,
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}
