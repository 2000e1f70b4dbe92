use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{OptionalExtension, Row, params};

use vigil_domain::{Incident, IncidentFilter, IncidentStatus};
use vigil_ports::IncidentStore;

use crate::SqliteStorage;
use crate::codec::{json, millis, opt_millis, opt_timestamp, parsed, sql_limit, timestamp, to_json};

const INCIDENT_COLUMNS: &str = "id, title, status, severity, components_json, updates_json, \
     started_at_ms, resolved_at_ms, postmortem, created_by, created_at_ms, updated_at_ms";

fn incident_from_row(row: &Row<'_>) -> rusqlite::Result<Incident> {
    Ok(Incident {
        id: row.get(0)?,
        title: row.get(1)?,
        status: parsed(row, 2)?,
        severity: parsed(row, 3)?,
        affected_components: json(row, 4)?,
        updates: json(row, 5)?,
        started_at: timestamp(row, 6)?,
        resolved_at: opt_timestamp(row, 7)?,
        postmortem: row.get(8)?,
        created_by: row.get(9)?,
        created_at: timestamp(row, 10)?,
        updated_at: timestamp(row, 11)?,
    })
}

fn filter_clause(filter: IncidentFilter) -> String {
    let resolved = IncidentStatus::Resolved.as_str();
    match filter {
        IncidentFilter::All => String::new(),
        IncidentFilter::Active => format!("WHERE status != '{resolved}'"),
        IncidentFilter::Resolved => format!("WHERE status = '{resolved}'"),
    }
}

#[async_trait]
impl IncidentStore for SqliteStorage {
    async fn insert_incident(&self, incident: Incident) -> Result<()> {
        self.run(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO incidents ({INCIDENT_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
                ),
                params![
                    incident.id,
                    incident.title,
                    incident.status.as_str(),
                    incident.severity.as_str(),
                    to_json(&incident.affected_components)?,
                    to_json(&incident.updates)?,
                    millis(incident.started_at),
                    opt_millis(incident.resolved_at),
                    incident.postmortem,
                    incident.created_by,
                    millis(incident.created_at),
                    millis(incident.updated_at),
                ],
            )
            .with_context(|| format!("failed to insert incident {}", incident.id))?;
            Ok(())
        })
        .await
    }

    async fn get_incident(&self, id: &str) -> Result<Option<Incident>> {
        let id = id.to_string();
        self.run(move |conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {INCIDENT_COLUMNS} FROM incidents WHERE id = ?1"),
                    params![id],
                    incident_from_row,
                )
                .optional()?)
        })
        .await
    }

    async fn update_incident(&self, incident: Incident) -> Result<bool> {
        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE incidents SET
                    title = ?2, status = ?3, severity = ?4, components_json = ?5,
                    updates_json = ?6, started_at_ms = ?7, resolved_at_ms = ?8,
                    postmortem = ?9, updated_at_ms = ?10
                 WHERE id = ?1",
                params![
                    incident.id,
                    incident.title,
                    incident.status.as_str(),
                    incident.severity.as_str(),
                    to_json(&incident.affected_components)?,
                    to_json(&incident.updates)?,
                    millis(incident.started_at),
                    opt_millis(incident.resolved_at),
                    incident.postmortem,
                    millis(incident.updated_at),
                ],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn delete_incident(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.run(move |conn| Ok(conn.execute("DELETE FROM incidents WHERE id = ?1", params![id])? > 0))
            .await
    }

    async fn list_incidents(
        &self,
        filter: IncidentFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Incident>> {
        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {INCIDENT_COLUMNS} FROM incidents {}
                 ORDER BY started_at_ms DESC, created_at_ms DESC
                 LIMIT ?1 OFFSET ?2",
                filter_clause(filter)
            ))?;
            let incidents = stmt
                .query_map(params![sql_limit(limit), sql_limit(offset)], incident_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(incidents)
        })
        .await
    }

    async fn count_incidents(&self, filter: IncidentFilter) -> Result<u64> {
        self.run(move |conn| {
            let count: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM incidents {}", filter_clause(filter)),
                [],
                |row| row.get(0),
            )?;
            Ok(u64::try_from(count).unwrap_or(0))
        })
        .await
    }
}
