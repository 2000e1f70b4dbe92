use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::info;

use vigil_domain::{
    CreateMaintenanceRequest, Maintenance, MaintenanceFilter, UpdateMaintenanceRequest,
    VigilError, VigilResult,
};
use vigil_ports::StoragePort;

pub const PUBLIC_LIST_LIMIT: u64 = 20;
pub const ADMIN_LIST_LIMIT: u64 = 50;

#[derive(Clone)]
pub struct MaintenanceService {
    storage: Arc<dyn StoragePort>,
}

impl MaintenanceService {
    pub fn new(storage: Arc<dyn StoragePort>) -> Self {
        Self { storage }
    }

    pub async fn schedule(
        &self,
        request: CreateMaintenanceRequest,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> VigilResult<Maintenance> {
        let new = request.validate()?;
        let maintenance = Maintenance::schedule(
            uuid::Uuid::new_v4().to_string(),
            new,
            created_by.to_string(),
            now,
        );
        self.storage
            .insert_maintenance(maintenance.clone())
            .await
            .context("failed to save maintenance")?;
        info!(
            id = %maintenance.id,
            start = %maintenance.scheduled_start,
            "maintenance scheduled by {created_by}"
        );
        Ok(maintenance)
    }

    pub async fn update_status(
        &self,
        request: UpdateMaintenanceRequest,
        now: DateTime<Utc>,
    ) -> VigilResult<Maintenance> {
        let (id, status) = request.validate()?;
        let mut maintenance = self
            .storage
            .get_maintenance(&id)
            .await?
            .ok_or(VigilError::NotFound("Maintenance"))?;
        maintenance.transition(status, now)?;
        if !self.storage.update_maintenance(maintenance.clone()).await? {
            return Err(VigilError::NotFound("Maintenance"));
        }
        info!(id = %maintenance.id, status = %maintenance.status, "maintenance updated");
        Ok(maintenance)
    }

    pub async fn delete(&self, id: Option<&str>) -> VigilResult<()> {
        let id = id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| VigilError::validation("ID is required"))?;
        if !self.storage.delete_maintenance(id).await? {
            return Err(VigilError::NotFound("Maintenance"));
        }
        info!(id, "maintenance deleted");
        Ok(())
    }

    /// Admin view: latest scheduled windows first.
    pub async fn list_recent(&self, now: DateTime<Utc>) -> VigilResult<Vec<Maintenance>> {
        Ok(self
            .storage
            .list_maintenance(MaintenanceFilter::All, now, true, ADMIN_LIST_LIMIT)
            .await?)
    }

    pub async fn list(
        &self,
        filter: MaintenanceFilter,
        now: DateTime<Utc>,
    ) -> VigilResult<Vec<Maintenance>> {
        Ok(self
            .storage
            .list_maintenance(filter, now, filter.newest_first(), PUBLIC_LIST_LIMIT)
            .await?)
    }
}
