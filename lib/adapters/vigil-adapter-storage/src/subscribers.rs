use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{OptionalExtension, Row, params};

use vigil_domain::Subscriber;
use vigil_ports::SubscriberStore;

use crate::SqliteStorage;
use crate::codec::{json, millis, opt_millis, opt_timestamp, timestamp, to_json};

const SUBSCRIBER_COLUMNS: &str = "id, email, verified, verification_token, unsubscribe_token, \
     components_json, created_at_ms, verified_at_ms";

fn subscriber_from_row(row: &Row<'_>) -> rusqlite::Result<Subscriber> {
    Ok(Subscriber {
        id: row.get(0)?,
        email: row.get(1)?,
        verified: row.get(2)?,
        verification_token: row.get(3)?,
        unsubscribe_token: row.get(4)?,
        components: json(row, 5)?,
        created_at: timestamp(row, 6)?,
        verified_at: opt_timestamp(row, 7)?,
    })
}

impl SqliteStorage {
    async fn find_subscriber_where(&self, column: &'static str, value: &str) -> Result<Option<Subscriber>> {
        let value = value.to_string();
        self.run(move |conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {SUBSCRIBER_COLUMNS} FROM subscribers WHERE {column} = ?1"),
                    params![value],
                    subscriber_from_row,
                )
                .optional()?)
        })
        .await
    }
}

#[async_trait]
impl SubscriberStore for SqliteStorage {
    async fn find_subscriber_by_email(&self, email: &str) -> Result<Option<Subscriber>> {
        self.find_subscriber_where("email", email).await
    }

    async fn insert_subscriber(&self, subscriber: Subscriber) -> Result<()> {
        self.run(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO subscribers ({SUBSCRIBER_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
                ),
                params![
                    subscriber.id,
                    subscriber.email,
                    subscriber.verified,
                    subscriber.verification_token,
                    subscriber.unsubscribe_token,
                    to_json(&subscriber.components)?,
                    millis(subscriber.created_at),
                    opt_millis(subscriber.verified_at),
                ],
            )
            .with_context(|| format!("failed to insert subscriber {}", subscriber.email))?;
            Ok(())
        })
        .await
    }

    async fn update_subscriber(&self, subscriber: Subscriber) -> Result<bool> {
        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE subscribers SET
                    email = ?2, verified = ?3, verification_token = ?4,
                    unsubscribe_token = ?5, components_json = ?6, verified_at_ms = ?7
                 WHERE id = ?1",
                params![
                    subscriber.id,
                    subscriber.email,
                    subscriber.verified,
                    subscriber.verification_token,
                    subscriber.unsubscribe_token,
                    to_json(&subscriber.components)?,
                    opt_millis(subscriber.verified_at),
                ],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn find_subscriber_by_verification_token(
        &self,
        token: &str,
    ) -> Result<Option<Subscriber>> {
        self.find_subscriber_where("verification_token", token).await
    }

    async fn delete_subscriber_by_unsubscribe_token(
        &self,
        token: &str,
    ) -> Result<Option<Subscriber>> {
        let token = token.to_string();
        self.run(move |conn| {
            let tx = conn.transaction()?;
            let subscriber = tx
                .query_row(
                    &format!(
                        "SELECT {SUBSCRIBER_COLUMNS} FROM subscribers WHERE unsubscribe_token = ?1"
                    ),
                    params![token],
                    subscriber_from_row,
                )
                .optional()?;
            if let Some(subscriber) = &subscriber {
                tx.execute("DELETE FROM subscribers WHERE id = ?1", params![subscriber.id])?;
            }
            tx.commit().context("failed to commit unsubscribe")?;
            Ok(subscriber)
        })
        .await
    }

    async fn verified_subscribers(&self) -> Result<Vec<Subscriber>> {
        self.run(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SUBSCRIBER_COLUMNS} FROM subscribers
                 WHERE verified = 1
                 ORDER BY created_at_ms ASC"
            ))?;
            let subscribers = stmt
                .query_map([], subscriber_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(subscribers)
        })
        .await
    }
}
