use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use vigil_domain::{
    ComponentType, Incident, IncidentFilter, Maintenance, MaintenanceFilter, StatusCheck,
    Subscriber,
};

use crate::storage::{IncidentStore, MaintenanceStore, StatusCheckStore, SubscriberStore};

#[derive(Debug, Default)]
struct Tables {
    checks: Vec<StatusCheck>,
    incidents: Vec<Incident>,
    maintenance: Vec<Maintenance>,
    subscribers: Vec<Subscriber>,
}

/// Process-local storage. Cloning shares the same tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| anyhow!("in-memory storage lock poisoned"))
    }
}

#[async_trait]
impl StatusCheckStore for InMemoryStorage {
    async fn insert_checks(&self, checks: Vec<StatusCheck>) -> Result<()> {
        self.lock()?.checks.extend(checks);
        Ok(())
    }

    async fn latest_check(&self, component: ComponentType) -> Result<Option<StatusCheck>> {
        Ok(self
            .lock()?
            .checks
            .iter()
            .filter(|check| check.component == component)
            .max_by_key(|check| check.timestamp)
            .cloned())
    }

    async fn checks_since(
        &self,
        component: ComponentType,
        since: DateTime<Utc>,
    ) -> Result<Vec<StatusCheck>> {
        let mut checks: Vec<_> = self
            .lock()?
            .checks
            .iter()
            .filter(|check| check.component == component && check.timestamp >= since)
            .cloned()
            .collect();
        checks.sort_by_key(|check| check.timestamp);
        Ok(checks)
    }

    async fn prune_checks_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut tables = self.lock()?;
        let before = tables.checks.len();
        tables.checks.retain(|check| check.timestamp >= cutoff);
        Ok((before - tables.checks.len()) as u64)
    }
}

#[async_trait]
impl IncidentStore for InMemoryStorage {
    async fn insert_incident(&self, incident: Incident) -> Result<()> {
        let mut tables = self.lock()?;
        if tables.incidents.iter().any(|existing| existing.id == incident.id) {
            bail!("incident {} already exists", incident.id);
        }
        tables.incidents.push(incident);
        Ok(())
    }

    async fn get_incident(&self, id: &str) -> Result<Option<Incident>> {
        Ok(self.lock()?.incidents.iter().find(|i| i.id == id).cloned())
    }

    async fn update_incident(&self, incident: Incident) -> Result<bool> {
        let mut tables = self.lock()?;
        match tables.incidents.iter_mut().find(|i| i.id == incident.id) {
            Some(existing) => {
                *existing = incident;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_incident(&self, id: &str) -> Result<bool> {
        let mut tables = self.lock()?;
        let before = tables.incidents.len();
        tables.incidents.retain(|i| i.id != id);
        Ok(tables.incidents.len() != before)
    }

    async fn list_incidents(
        &self,
        filter: IncidentFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Incident>> {
        let mut incidents: Vec<_> = self
            .lock()?
            .incidents
            .iter()
            .filter(|incident| filter.matches(incident))
            .cloned()
            .collect();
        incidents.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(incidents
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .collect())
    }

    async fn count_incidents(&self, filter: IncidentFilter) -> Result<u64> {
        Ok(self
            .lock()?
            .incidents
            .iter()
            .filter(|incident| filter.matches(incident))
            .count() as u64)
    }
}

#[async_trait]
impl MaintenanceStore for InMemoryStorage {
    async fn insert_maintenance(&self, maintenance: Maintenance) -> Result<()> {
        let mut tables = self.lock()?;
        if tables.maintenance.iter().any(|m| m.id == maintenance.id) {
            bail!("maintenance {} already exists", maintenance.id);
        }
        tables.maintenance.push(maintenance);
        Ok(())
    }

    async fn get_maintenance(&self, id: &str) -> Result<Option<Maintenance>> {
        Ok(self.lock()?.maintenance.iter().find(|m| m.id == id).cloned())
    }

    async fn update_maintenance(&self, maintenance: Maintenance) -> Result<bool> {
        let mut tables = self.lock()?;
        match tables.maintenance.iter_mut().find(|m| m.id == maintenance.id) {
            Some(existing) => {
                *existing = maintenance;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_maintenance(&self, id: &str) -> Result<bool> {
        let mut tables = self.lock()?;
        let before = tables.maintenance.len();
        tables.maintenance.retain(|m| m.id != id);
        Ok(tables.maintenance.len() != before)
    }

    async fn list_maintenance(
        &self,
        filter: MaintenanceFilter,
        now: DateTime<Utc>,
        newest_first: bool,
        limit: u64,
    ) -> Result<Vec<Maintenance>> {
        let mut windows: Vec<_> = self
            .lock()?
            .maintenance
            .iter()
            .filter(|m| filter.matches(m, now))
            .cloned()
            .collect();
        windows.sort_by_key(|m| m.scheduled_start);
        if newest_first {
            windows.reverse();
        }
        windows.truncate(limit as usize);
        Ok(windows)
    }
}

#[async_trait]
impl SubscriberStore for InMemoryStorage {
    async fn find_subscriber_by_email(&self, email: &str) -> Result<Option<Subscriber>> {
        Ok(self
            .lock()?
            .subscribers
            .iter()
            .find(|s| s.email == email)
            .cloned())
    }

    async fn insert_subscriber(&self, subscriber: Subscriber) -> Result<()> {
        let mut tables = self.lock()?;
        if tables.subscribers.iter().any(|s| s.email == subscriber.email) {
            bail!("subscriber {} already exists", subscriber.email);
        }
        tables.subscribers.push(subscriber);
        Ok(())
    }

    async fn update_subscriber(&self, subscriber: Subscriber) -> Result<bool> {
        let mut tables = self.lock()?;
        match tables.subscribers.iter_mut().find(|s| s.id == subscriber.id) {
            Some(existing) => {
                *existing = subscriber;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_subscriber_by_verification_token(
        &self,
        token: &str,
    ) -> Result<Option<Subscriber>> {
        Ok(self
            .lock()?
            .subscribers
            .iter()
            .find(|s| s.verification_token.as_deref() == Some(token))
            .cloned())
    }

    async fn delete_subscriber_by_unsubscribe_token(
        &self,
        token: &str,
    ) -> Result<Option<Subscriber>> {
        let mut tables = self.lock()?;
        let position = tables
            .subscribers
            .iter()
            .position(|s| s.unsubscribe_token == token);
        Ok(position.map(|index| tables.subscribers.remove(index)))
    }

    async fn verified_subscribers(&self) -> Result<Vec<Subscriber>> {
        Ok(self
            .lock()?
            .subscribers
            .iter()
            .filter(|s| s.verified)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use vigil_domain::StatusLevel;

    #[tokio::test]
    async fn latest_check_wins_by_timestamp() {
        let storage = InMemoryStorage::new();
        let now = Utc::now();
        storage
            .insert_checks(vec![
                StatusCheck::new(now, ComponentType::Api, StatusLevel::Degraded, 10, 200),
                StatusCheck::new(
                    now - Duration::minutes(5),
                    ComponentType::Api,
                    StatusLevel::MajorOutage,
                    10,
                    500,
                ),
            ])
            .await
            .unwrap();

        let latest = storage.latest_check(ComponentType::Api).await.unwrap().unwrap();
        assert_eq!(latest.status, StatusLevel::Degraded);
        assert!(storage.latest_check(ComponentType::Cache).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn prune_drops_old_checks() {
        let storage = InMemoryStorage::new();
        let now = Utc::now();
        storage
            .insert_checks(vec![
                StatusCheck::new(now - Duration::days(91), ComponentType::Api, StatusLevel::Operational, 1, 200),
                StatusCheck::new(now, ComponentType::Api, StatusLevel::Operational, 1, 200),
            ])
            .await
            .unwrap();
        let pruned = storage
            .prune_checks_before(now - Duration::days(90))
            .await
            .unwrap();
        assert_eq!(pruned, 1);
        let remaining = storage
            .checks_since(ComponentType::Api, now - Duration::days(365))
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
    }
}
