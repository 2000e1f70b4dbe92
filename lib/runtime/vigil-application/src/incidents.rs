use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use vigil_domain::{
    CreateIncidentRequest, Incident, IncidentFilter, UpdateIncidentRequest, VigilError,
    VigilResult,
};
use vigil_ports::{IncidentAnnouncement, StoragePort};

use crate::notifier::NotificationService;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;
pub const ADMIN_LIST_LIMIT: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(total: u64, page: u64, limit: u64) -> Self {
        Self {
            total,
            page,
            limit,
            pages: total.div_ceil(limit),
        }
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IncidentPage {
    pub incidents: Vec<Incident>,
    pub pagination: Pagination,
}

/// Incident lifecycle for admins plus the public read side.
#[derive(Clone)]
pub struct IncidentService {
    storage: Arc<dyn StoragePort>,
    notifier: NotificationService,
}

impl IncidentService {
    pub fn new(storage: Arc<dyn StoragePort>, notifier: NotificationService) -> Self {
        Self { storage, notifier }
    }

    /// Open an incident and announce it in the background.
    pub async fn create(
        &self,
        request: CreateIncidentRequest,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> VigilResult<Incident> {
        let new = request.validate()?;
        let announcement = IncidentAnnouncement {
            title: new.title.clone(),
            severity: new.severity,
            message: new.notification_message(),
            affected_components: new.affected_components.clone(),
        };

        let incident = Incident::open(
            uuid::Uuid::new_v4().to_string(),
            new,
            created_by.to_string(),
            now,
        );
        self.storage
            .insert_incident(incident.clone())
            .await
            .context("failed to save incident")?;
        info!(id = %incident.id, severity = %incident.severity, "incident opened by {created_by}");

        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            notifier.notify_incident(&announcement).await;
        });
        Ok(incident)
    }

    pub async fn get(&self, id: &str) -> VigilResult<Incident> {
        self.storage
            .get_incident(id)
            .await?
            .ok_or(VigilError::NotFound("Incident"))
    }

    pub async fn update(
        &self,
        id: &str,
        request: UpdateIncidentRequest,
        now: DateTime<Utc>,
    ) -> VigilResult<Incident> {
        let patch = request.validate()?;
        let mut incident = self.get(id).await?;
        incident.apply(patch, now);
        if !self.storage.update_incident(incident.clone()).await? {
            return Err(VigilError::NotFound("Incident"));
        }
        info!(id = %incident.id, status = %incident.status, "incident updated");
        Ok(incident)
    }

    pub async fn delete(&self, id: &str) -> VigilResult<()> {
        if !self.storage.delete_incident(id).await? {
            return Err(VigilError::NotFound("Incident"));
        }
        info!(id, "incident deleted");
        Ok(())
    }

    /// Newest incidents regardless of status.
    pub async fn list_recent(&self) -> VigilResult<Vec<Incident>> {
        Ok(self
            .storage
            .list_incidents(IncidentFilter::All, 0, ADMIN_LIST_LIMIT)
            .await?)
    }

    /// Paginated public listing. `page` starts at 1; out-of-range values are
    /// clamped rather than rejected.
    pub async fn list(
        &self,
        filter: IncidentFilter,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> VigilResult<IncidentPage> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let page = page.unwrap_or(1).clamp(1, u64::MAX / limit);
        let total = self.storage.count_incidents(filter).await?;
        let pagination = Pagination::new(total, page, limit);
        let incidents = self
            .storage
            .list_incidents(filter, pagination.offset(), limit)
            .await?;
        Ok(IncidentPage {
            incidents,
            pagination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::SiteInfo;
    use crate::testing::{RecordingChat, RecordingMailer};
    use chrono::Duration;
    use vigil_domain::{IncidentSeverity, IncidentStatus};
    use vigil_ports::{ChatEvent, InMemoryStorage};

    fn service(chat: Arc<RecordingChat>) -> IncidentService {
        let storage: Arc<dyn StoragePort> = Arc::new(InMemoryStorage::new());
        let notifier = NotificationService::new(
            storage.clone(),
            Arc::new(RecordingMailer::default()),
            vec![chat],
            SiteInfo::new("Status", "http://localhost"),
        );
        IncidentService::new(storage, notifier)
    }

    fn request(title: &str) -> CreateIncidentRequest {
        CreateIncidentRequest {
            title: Some(title.into()),
            severity: Some("major".into()),
            affected_components: Some(vec!["api".into(), "database".into()]),
            message: None,
        }
    }

    #[tokio::test]
    async fn create_stores_and_announces() {
        let chat = Arc::new(RecordingChat::new("slack"));
        let service = service(chat.clone());
        let incident = service
            .create(request("Elevated errors"), "ops@example.com", Utc::now())
            .await
            .unwrap();

        assert_eq!(incident.status, IncidentStatus::Investigating);
        assert_eq!(incident.severity, IncidentSeverity::Major);
        assert!(incident.updates.is_empty());
        assert_eq!(service.get(&incident.id).await.unwrap(), incident);

        for _ in 0..50 {
            if !chat.events().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        let ChatEvent::Incident(announcement) = &chat.events()[0] else {
            panic!("expected an incident event");
        };
        assert_eq!(
            announcement.message,
            "We are investigating an issue with Elevated errors"
        );
    }

    #[tokio::test]
    async fn invalid_create_is_rejected() {
        let service = service(Arc::new(RecordingChat::new("slack")));
        let mut bad = request("Broken");
        bad.affected_components = Some(vec!["mainframe".into()]);
        let err = service.create(bad, "ops", Utc::now()).await.unwrap_err();
        assert!(matches!(err, VigilError::Validation(_)));
    }

    #[tokio::test]
    async fn update_resolves_once() {
        let service = service(Arc::new(RecordingChat::new("slack")));
        let now = Utc::now();
        let incident = service.create(request("Outage"), "ops", now).await.unwrap();

        let resolve = || UpdateIncidentRequest {
            status: Some("resolved".into()),
            message: Some("Fixed".into()),
            postmortem: None,
        };
        let first = service
            .update(&incident.id, resolve(), now + Duration::minutes(10))
            .await
            .unwrap();
        let second = service
            .update(&incident.id, resolve(), now + Duration::minutes(20))
            .await
            .unwrap();

        assert_eq!(first.resolved_at, Some(now + Duration::minutes(10)));
        assert_eq!(second.resolved_at, first.resolved_at);
        assert_eq!(second.updates.len(), 2);
    }

    #[tokio::test]
    async fn missing_incident_is_not_found() {
        let service = service(Arc::new(RecordingChat::new("slack")));
        assert!(matches!(
            service.get("nope").await,
            Err(VigilError::NotFound("Incident"))
        ));
        assert!(matches!(
            service.delete("nope").await,
            Err(VigilError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_paginates_newest_first() {
        let service = service(Arc::new(RecordingChat::new("slack")));
        let start = Utc::now() - Duration::hours(10);
        for i in 0..5 {
            service
                .create(request(&format!("incident {i}")), "ops", start + Duration::hours(i))
                .await
                .unwrap();
        }

        let page = service
            .list(IncidentFilter::All, Some(2), Some(2))
            .await
            .unwrap();
        assert_eq!(page.pagination, Pagination::new(5, 2, 2));
        assert_eq!(page.pagination.pages, 3);
        let titles: Vec<_> = page.incidents.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["incident 2", "incident 1"]);

        let clamped = service.list(IncidentFilter::All, Some(0), Some(0)).await.unwrap();
        assert_eq!(clamped.pagination.page, 1);
        assert_eq!(clamped.pagination.limit, 1);

        assert_eq!(service.list_recent().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn far_out_pages_are_empty() {
        let service = service(Arc::new(RecordingChat::new("slack")));
        service
            .create(request("only one"), "ops", Utc::now())
            .await
            .unwrap();

        let page = service
            .list(IncidentFilter::All, Some(u64::MAX), None)
            .await
            .unwrap();
        assert!(page.incidents.is_empty());
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.pagination.page, u64::MAX / DEFAULT_PAGE_SIZE);

        let page = service
            .list(IncidentFilter::All, Some(u64::MAX), Some(1))
            .await
            .unwrap();
        assert!(page.incidents.is_empty());
        assert_eq!(Pagination::new(1, u64::MAX, 1).offset(), u64::MAX - 1);
    }
}
