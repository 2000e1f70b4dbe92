use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use vigil_domain::{
    ComponentType, Incident, IncidentFilter, Maintenance, MaintenanceFilter, StatusCheck,
    Subscriber,
};

#[async_trait]
pub trait StatusCheckStore: Send + Sync {
    async fn insert_checks(&self, checks: Vec<StatusCheck>) -> Result<()>;

    /// Most recent check for `component`, by timestamp.
    async fn latest_check(&self, component: ComponentType) -> Result<Option<StatusCheck>>;

    /// Checks with `timestamp >= since`, oldest first.
    async fn checks_since(
        &self,
        component: ComponentType,
        since: DateTime<Utc>,
    ) -> Result<Vec<StatusCheck>>;

    /// Drop checks older than `cutoff`; returns how many went.
    async fn prune_checks_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

#[async_trait]
pub trait IncidentStore: Send + Sync {
    async fn insert_incident(&self, incident: Incident) -> Result<()>;
    async fn get_incident(&self, id: &str) -> Result<Option<Incident>>;
    /// Returns false when no incident has that id.
    async fn update_incident(&self, incident: Incident) -> Result<bool>;
    async fn delete_incident(&self, id: &str) -> Result<bool>;
    /// Newest `started_at` first.
    async fn list_incidents(
        &self,
        filter: IncidentFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Incident>>;
    async fn count_incidents(&self, filter: IncidentFilter) -> Result<u64>;
}

#[async_trait]
pub trait MaintenanceStore: Send + Sync {
    async fn insert_maintenance(&self, maintenance: Maintenance) -> Result<()>;
    async fn get_maintenance(&self, id: &str) -> Result<Option<Maintenance>>;
    async fn update_maintenance(&self, maintenance: Maintenance) -> Result<bool>;
    async fn delete_maintenance(&self, id: &str) -> Result<bool>;
    /// Ordered by `scheduled_start`, newest first when `newest_first`.
    async fn list_maintenance(
        &self,
        filter: MaintenanceFilter,
        now: DateTime<Utc>,
        newest_first: bool,
        limit: u64,
    ) -> Result<Vec<Maintenance>>;
}

#[async_trait]
pub trait SubscriberStore: Send + Sync {
    async fn find_subscriber_by_email(&self, email: &str) -> Result<Option<Subscriber>>;
    /// Fails when the email is already present.
    async fn insert_subscriber(&self, subscriber: Subscriber) -> Result<()>;
    async fn update_subscriber(&self, subscriber: Subscriber) -> Result<bool>;
    async fn find_subscriber_by_verification_token(&self, token: &str)
    -> Result<Option<Subscriber>>;
    async fn delete_subscriber_by_unsubscribe_token(&self, token: &str)
    -> Result<Option<Subscriber>>;
    async fn verified_subscribers(&self) -> Result<Vec<Subscriber>>;
}

/// Everything the application persists, behind one handle.
pub trait StoragePort: StatusCheckStore + IncidentStore + MaintenanceStore + SubscriberStore {}

impl<T> StoragePort for T where
    T: StatusCheckStore + IncidentStore + MaintenanceStore + SubscriberStore
{
}
