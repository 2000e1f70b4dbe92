use anyhow::{Context, Result};
use rusqlite::Connection;

pub const SCHEMA_VERSION: i64 = 1;

pub(crate) fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS status_checks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp_ms INTEGER NOT NULL,
            component TEXT NOT NULL,
            status TEXT NOT NULL,
            response_time_ms INTEGER NOT NULL,
            status_code INTEGER NOT NULL,
            details_json TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_status_checks_component_time
            ON status_checks (component, timestamp_ms DESC);
        CREATE INDEX IF NOT EXISTS idx_status_checks_time
            ON status_checks (timestamp_ms);

        CREATE TABLE IF NOT EXISTS incidents (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            status TEXT NOT NULL,
            severity TEXT NOT NULL,
            components_json TEXT NOT NULL,
            updates_json TEXT NOT NULL,
            started_at_ms INTEGER NOT NULL,
            resolved_at_ms INTEGER,
            postmortem TEXT,
            created_by TEXT NOT NULL,
            created_at_ms INTEGER NOT NULL,
            updated_at_ms INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_incidents_status_started
            ON incidents (status, started_at_ms DESC);

        CREATE TABLE IF NOT EXISTS maintenance (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            components_json TEXT NOT NULL,
            scheduled_start_ms INTEGER NOT NULL,
            scheduled_end_ms INTEGER NOT NULL,
            status TEXT NOT NULL,
            created_by TEXT NOT NULL,
            created_at_ms INTEGER NOT NULL,
            updated_at_ms INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_maintenance_status_start
            ON maintenance (status, scheduled_start_ms);

        CREATE TABLE IF NOT EXISTS subscribers (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            verified INTEGER NOT NULL DEFAULT 0,
            verification_token TEXT,
            unsubscribe_token TEXT NOT NULL UNIQUE,
            components_json TEXT NOT NULL,
            created_at_ms INTEGER NOT NULL,
            verified_at_ms INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_subscribers_verification_token
            ON subscribers (verification_token);
        ",
    )
    .context("failed to create sqlite schema")?;

    conn.pragma_update(None, "user_version", SCHEMA_VERSION)
        .context("failed to stamp schema version")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        let version: i64 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }
}
