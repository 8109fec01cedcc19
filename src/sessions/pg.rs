use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{SessionData, SessionStore};

/// Sessions persisted in the `sessions` table.
#[derive(Clone)]
pub struct PgSessionStore {
    db: PgPool,
    ttl: Duration,
}

impl PgSessionStore {
    pub fn new(db: PgPool, ttl: Duration) -> Self {
        Self { db, ttl }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<SessionData>> {
        let row: Option<(Json<SessionData>,)> = sqlx::query_as(
            r#"
            SELECT data
              FROM sessions
             WHERE id = $1 AND expires_at > now()
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("load session")?;
        Ok(row.map(|(Json(data),)| data))
    }

    async fn set(&self, id: Uuid, data: SessionData) -> anyhow::Result<()> {
        let expires_at = OffsetDateTime::now_utc() + self.ttl;
        sqlx::query(
            r#"
            INSERT INTO sessions (id, data, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
               SET data = EXCLUDED.data,
                   expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(id)
        .bind(Json(data))
        .bind(expires_at)
        .execute(&self.db)
        .await
        .context("save session")?;
        Ok(())
    }

    async fn destroy(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("destroy session")?;
        Ok(())
    }

    async fn purge_expired(&self) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
            .execute(&self.db)
            .await
            .context("purge expired sessions")?;
        Ok(res.rows_affected())
    }
}
