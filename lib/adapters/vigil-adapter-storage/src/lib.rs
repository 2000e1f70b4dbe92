//! SQLite persistence for checks, incidents, maintenance and subscribers.

mod checks;
mod codec;
mod incidents;
mod maintenance;
mod schema;
mod subscribers;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::info;

pub use schema::SCHEMA_VERSION;

const POOL_SIZE: u32 = 8;

/// Pooled SQLite handle. Every query runs on the blocking thread pool.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: Pool<SqliteConnectionManager>,
    path: PathBuf,
}

impl SqliteStorage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let manager = SqliteConnectionManager::file(&path).with_init(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA busy_timeout = 5000;",
            )
        });
        let pool = Pool::builder()
            .max_size(POOL_SIZE)
            .build(manager)
            .with_context(|| format!("failed to open sqlite database {}", path.display()))?;

        let conn = pool.get().context("failed to get sqlite connection")?;
        schema::ensure_schema(&conn)?;
        info!("sqlite storage ready at {}", path.display());

        Ok(Self { pool, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().context("failed to get sqlite connection")?;
            op(&mut conn)
        })
        .await
        .context("sqlite task panicked")?
    }
}
