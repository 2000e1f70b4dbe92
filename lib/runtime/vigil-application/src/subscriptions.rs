use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use vigil_domain::{SubscribeRequest, Subscriber, VigilError, VigilResult};
use vigil_ports::{Delivery, StoragePort};

use crate::notifier::NotificationService;
use crate::tokens::generate_token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    AlreadySubscribed,
    VerificationResent,
    VerificationSent,
    AutoVerified,
}

impl SubscribeOutcome {
    pub fn message(self) -> &'static str {
        match self {
            SubscribeOutcome::AlreadySubscribed => "You are already subscribed to status updates.",
            SubscribeOutcome::VerificationResent => {
                "Verification email resent. Please check your inbox."
            }
            SubscribeOutcome::VerificationSent => {
                "Please check your email to verify your subscription."
            }
            SubscribeOutcome::AutoVerified => "Subscribed successfully!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    AlreadyVerified,
}

impl VerifyOutcome {
    /// Value for the `status` query parameter of the redirect.
    pub fn as_str(self) -> &'static str {
        match self {
            VerifyOutcome::Verified => "verified",
            VerifyOutcome::AlreadyVerified => "already_verified",
        }
    }
}

/// Email subscription flow: subscribe, verify, unsubscribe.
#[derive(Clone)]
pub struct SubscriptionService {
    storage: Arc<dyn StoragePort>,
    notifier: NotificationService,
    auto_verify_without_mailer: bool,
}

impl SubscriptionService {
    pub fn new(
        storage: Arc<dyn StoragePort>,
        notifier: NotificationService,
        auto_verify_without_mailer: bool,
    ) -> Self {
        Self {
            storage,
            notifier,
            auto_verify_without_mailer,
        }
    }

    pub async fn subscribe(
        &self,
        request: SubscribeRequest,
        now: DateTime<Utc>,
    ) -> VigilResult<SubscribeOutcome> {
        let new = request.validate()?;

        if let Some(existing) = self.storage.find_subscriber_by_email(&new.email).await? {
            return self.resubscribe(existing).await;
        }

        let verification_token = generate_token();
        let mut subscriber = Subscriber::pending(
            uuid::Uuid::new_v4().to_string(),
            new.email,
            new.components,
            verification_token.clone(),
            generate_token(),
            now,
        );

        if !self.notifier.mailer_configured() && self.auto_verify_without_mailer {
            subscriber.verify(now);
            if let Some(outcome) = self.insert(subscriber.clone()).await? {
                return Ok(outcome);
            }
            info!(email = %subscriber.email, "subscriber auto-verified, no mailer configured");
            return Ok(SubscribeOutcome::AutoVerified);
        }

        if let Some(outcome) = self.insert(subscriber.clone()).await? {
            return Ok(outcome);
        }
        info!(email = %subscriber.email, "subscriber created");
        self.send_verification(&subscriber.email, &verification_token)
            .await;
        Ok(SubscribeOutcome::VerificationSent)
    }

    /// A subscribe for an address that is already stored.
    async fn resubscribe(&self, mut existing: Subscriber) -> VigilResult<SubscribeOutcome> {
        if existing.verified {
            return Ok(SubscribeOutcome::AlreadySubscribed);
        }
        let token = match existing.verification_token.clone() {
            Some(token) => token,
            None => {
                let token = generate_token();
                existing.verification_token = Some(token.clone());
                self.storage.update_subscriber(existing.clone()).await?;
                token
            }
        };
        self.send_verification(&existing.email, &token).await;
        Ok(SubscribeOutcome::VerificationResent)
    }

    /// Store a new subscriber. When another request stored the same email
    /// first, answer as a repeat subscribe instead: `Some(outcome)`.
    async fn insert(&self, subscriber: Subscriber) -> VigilResult<Option<SubscribeOutcome>> {
        let Err(e) = self.storage.insert_subscriber(subscriber.clone()).await else {
            return Ok(None);
        };
        match self
            .storage
            .find_subscriber_by_email(&subscriber.email)
            .await?
        {
            Some(existing) => {
                info!(email = %existing.email, "subscriber stored concurrently, reusing it");
                Ok(Some(self.resubscribe(existing).await?))
            }
            None => Err(VigilError::Internal(e.context("failed to save subscriber"))),
        }
    }

    pub async fn verify(&self, token: Option<&str>, now: DateTime<Utc>) -> VigilResult<VerifyOutcome> {
        let token = required_token(token)?;
        let mut subscriber = self
            .storage
            .find_subscriber_by_verification_token(token)
            .await?
            .ok_or_else(|| VigilError::validation("Invalid or expired token"))?;
        if subscriber.verified {
            return Ok(VerifyOutcome::AlreadyVerified);
        }

        subscriber.verify(now);
        if !self.storage.update_subscriber(subscriber.clone()).await? {
            return Err(VigilError::NotFound("Subscriber"));
        }
        info!(email = %subscriber.email, "subscriber verified");
        Ok(VerifyOutcome::Verified)
    }

    pub async fn unsubscribe(&self, token: Option<&str>) -> VigilResult<()> {
        let token = required_token(token)?;
        let subscriber = self
            .storage
            .delete_subscriber_by_unsubscribe_token(token)
            .await?
            .ok_or(VigilError::NotFound("Subscriber"))?;
        info!(email = %subscriber.email, "subscriber removed");
        Ok(())
    }

    async fn send_verification(&self, email: &str, token: &str) {
        match self.notifier.send_verification(email, token).await {
            Ok(Delivery::Sent) => {}
            Ok(Delivery::Skipped) => warn!("verification email to {email} not sent, mailer not configured"),
            Err(e) => warn!("verification email to {email} failed: {e:#}"),
        }
    }
}

fn required_token(token: Option<&str>) -> VigilResult<&str> {
    token
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| VigilError::validation("Token is required"))
}
