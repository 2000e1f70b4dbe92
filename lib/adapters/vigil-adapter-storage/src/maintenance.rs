use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params, params_from_iter};

use vigil_domain::{Maintenance, MaintenanceFilter, MaintenanceStatus};
use vigil_ports::MaintenanceStore;

use crate::SqliteStorage;
use crate::codec::{json, millis, parsed, sql_limit, timestamp, to_json};

const MAINTENANCE_COLUMNS: &str = "id, title, description, components_json, scheduled_start_ms, \
     scheduled_end_ms, status, created_by, created_at_ms, updated_at_ms";

fn maintenance_from_row(row: &Row<'_>) -> rusqlite::Result<Maintenance> {
    Ok(Maintenance {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        affected_components: json(row, 3)?,
        scheduled_start: timestamp(row, 4)?,
        scheduled_end: timestamp(row, 5)?,
        status: parsed(row, 6)?,
        created_by: row.get(7)?,
        created_at: timestamp(row, 8)?,
        updated_at: timestamp(row, 9)?,
    })
}

/// WHERE clause for `filter` and the values its `?` placeholders take.
fn filter_clause(filter: MaintenanceFilter, now: DateTime<Utc>) -> (String, Vec<i64>) {
    match filter {
        MaintenanceFilter::All => (String::new(), Vec::new()),
        MaintenanceFilter::Upcoming => (
            format!(
                "WHERE status = '{}' AND scheduled_start_ms > ?",
                MaintenanceStatus::Scheduled.as_str()
            ),
            vec![millis(now)],
        ),
        MaintenanceFilter::Active => (
            format!("WHERE status = '{}'", MaintenanceStatus::InProgress.as_str()),
            Vec::new(),
        ),
        MaintenanceFilter::Completed => (
            format!("WHERE status = '{}'", MaintenanceStatus::Completed.as_str()),
            Vec::new(),
        ),
    }
}

#[async_trait]
impl MaintenanceStore for SqliteStorage {
    async fn insert_maintenance(&self, maintenance: Maintenance) -> Result<()> {
        self.run(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO maintenance ({MAINTENANCE_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
                ),
                params![
                    maintenance.id,
                    maintenance.title,
                    maintenance.description,
                    to_json(&maintenance.affected_components)?,
                    millis(maintenance.scheduled_start),
                    millis(maintenance.scheduled_end),
                    maintenance.status.as_str(),
                    maintenance.created_by,
                    millis(maintenance.created_at),
                    millis(maintenance.updated_at),
                ],
            )
            .with_context(|| format!("failed to insert maintenance {}", maintenance.id))?;
            Ok(())
        })
        .await
    }

    async fn get_maintenance(&self, id: &str) -> Result<Option<Maintenance>> {
        let id = id.to_string();
        self.run(move |conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {MAINTENANCE_COLUMNS} FROM maintenance WHERE id = ?1"),
                    params![id],
                    maintenance_from_row,
                )
                .optional()?)
        })
        .await
    }

    async fn update_maintenance(&self, maintenance: Maintenance) -> Result<bool> {
        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE maintenance SET
                    title = ?2, description = ?3, components_json = ?4,
                    scheduled_start_ms = ?5, scheduled_end_ms = ?6, status = ?7,
                    updated_at_ms = ?8
                 WHERE id = ?1",
                params![
                    maintenance.id,
                    maintenance.title,
                    maintenance.description,
                    to_json(&maintenance.affected_components)?,
                    millis(maintenance.scheduled_start),
                    millis(maintenance.scheduled_end),
                    maintenance.status.as_str(),
                    millis(maintenance.updated_at),
                ],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn delete_maintenance(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.run(move |conn| {
            Ok(conn.execute("DELETE FROM maintenance WHERE id = ?1", params![id])? > 0)
        })
        .await
    }

    async fn list_maintenance(
        &self,
        filter: MaintenanceFilter,
        now: DateTime<Utc>,
        newest_first: bool,
        limit: u64,
    ) -> Result<Vec<Maintenance>> {
        let order = if newest_first { "DESC" } else { "ASC" };
        let (clause, mut values) = filter_clause(filter, now);
        values.push(sql_limit(limit));
        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MAINTENANCE_COLUMNS} FROM maintenance {clause}
                 ORDER BY scheduled_start_ms {order}
                 LIMIT ?"
            ))?;
            let windows = stmt
                .query_map(params_from_iter(values), maintenance_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(windows)
        })
        .await
    }
}
