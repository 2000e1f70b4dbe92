use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};

use vigil_domain::{ComponentType, StatusCheck};
use vigil_ports::StatusCheckStore;

use crate::SqliteStorage;
use crate::codec::{json, millis, parsed, timestamp, to_json};

const CHECK_COLUMNS: &str =
    "timestamp_ms, component, status, response_time_ms, status_code, details_json";

fn check_from_row(row: &Row<'_>) -> rusqlite::Result<StatusCheck> {
    let response_time: i64 = row.get(3)?;
    Ok(StatusCheck {
        timestamp: timestamp(row, 0)?,
        component: parsed(row, 1)?,
        status: parsed(row, 2)?,
        response_time: u64::try_from(response_time).unwrap_or(0),
        status_code: row.get(4)?,
        details: json(row, 5)?,
    })
}

#[async_trait]
impl StatusCheckStore for SqliteStorage {
    async fn insert_checks(&self, checks: Vec<StatusCheck>) -> Result<()> {
        self.run(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(&format!(
                    "INSERT INTO status_checks ({CHECK_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
                ))?;
                for check in &checks {
                    stmt.execute(params![
                        millis(check.timestamp),
                        check.component.as_str(),
                        check.status.as_str(),
                        i64::try_from(check.response_time).unwrap_or(i64::MAX),
                        check.status_code,
                        to_json(&check.details)?,
                    ])?;
                }
            }
            tx.commit().context("failed to commit status checks")?;
            Ok(())
        })
        .await
    }

    async fn latest_check(&self, component: ComponentType) -> Result<Option<StatusCheck>> {
        self.run(move |conn| {
            let check = conn
                .query_row(
                    &format!(
                        "SELECT {CHECK_COLUMNS} FROM status_checks
                         WHERE component = ?1
                         ORDER BY timestamp_ms DESC, id DESC
                         LIMIT 1"
                    ),
                    params![component.as_str()],
                    check_from_row,
                )
                .optional()?;
            Ok(check)
        })
        .await
    }

    async fn checks_since(
        &self,
        component: ComponentType,
        since: DateTime<Utc>,
    ) -> Result<Vec<StatusCheck>> {
        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CHECK_COLUMNS} FROM status_checks
                 WHERE component = ?1 AND timestamp_ms >= ?2
                 ORDER BY timestamp_ms ASC, id ASC"
            ))?;
            let checks = stmt
                .query_map(params![component.as_str(), millis(since)], check_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(checks)
        })
        .await
    }

    async fn prune_checks_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        self.run(move |conn| {
            let removed = conn.execute(
                "DELETE FROM status_checks WHERE timestamp_ms < ?1",
                params![millis(cutoff)],
            )?;
            Ok(removed as u64)
        })
        .await
    }
}
