//! Postgres-backed chat store

use super::ChatStore;
use crate::error::AdvisorError;
use crate::models::ChatExchange;
use crate::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::error;
use uuid::Uuid;

pub struct PostgresChatStore {
    pool: PgPool,
    schema_ready: Arc<OnceCell<()>>,
}

impl PostgresChatStore {
    /// Create the pool without connecting; the first query connects
    pub fn connect_lazy(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy(url)?;

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            schema_ready: Arc::new(OnceCell::new()),
        }
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.schema_ready
            .get_or_try_init(|| async {
                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS chat_exchanges (
                      exchange_id UUID PRIMARY KEY,
                      user_id UUID NOT NULL,
                      message TEXT NOT NULL,
                      response TEXT NOT NULL,
                      created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                    );
                    "#,
                )
                .execute(&self.pool)
                .await?;

                sqlx::query(
                    r#"
                    CREATE INDEX IF NOT EXISTS idx_chat_exchanges_user_time
                    ON chat_exchanges (user_id, created_at DESC);
                    "#,
                )
                .execute(&self.pool)
                .await?;

                Ok::<(), sqlx::Error>(())
            })
            .await
            .map_err(|e| {
                AdvisorError::DatabaseError(format!(
                    "Failed to initialize chat exchange schema: {}",
                    e
                ))
            })?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl ChatStore for PostgresChatStore {
    async fn save(&self, exchange: &ChatExchange) -> Result<()> {
        self.ensure_schema().await?;

        sqlx::query(
            r#"
            INSERT INTO chat_exchanges (exchange_id, user_id, message, response, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(exchange.exchange_id)
        .bind(exchange.user_id)
        .bind(&exchange.message)
        .bind(&exchange.response)
        .bind(exchange.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to save chat exchange: {}", e);
            AdvisorError::DatabaseError(format!("Failed to save chat exchange: {}", e))
        })?;

        Ok(())
    }

    async fn history(&self, user_id: Uuid, limit: Option<usize>) -> Result<Vec<ChatExchange>> {
        self.ensure_schema().await?;

        // NULL limit means no limit in Postgres
        let limit = limit.map(|l| l.min(i64::MAX as usize) as i64);

        let rows = sqlx::query(
            r#"
            SELECT exchange_id, user_id, message, response, created_at
            FROM chat_exchanges
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AdvisorError::DatabaseError(format!("Failed to load chat history: {}", e))
        })?;

        rows.into_iter()
            .map(|row| -> Result<ChatExchange> {
                Ok(ChatExchange {
                    exchange_id: row.try_get("exchange_id")?,
                    user_id: row.try_get("user_id")?,
                    message: row.try_get("message")?,
                    response: row.try_get("response")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }
}
