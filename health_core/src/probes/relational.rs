//! Relational-store probe for the harvest pause flag

use super::{ProbeError, RelationalProbe};
use crate::error::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::info;

/// Reads operator state out of the crawl platform's relational store.
///
/// The pool is created lazily so an unreachable database degrades the
/// paused check instead of failing service startup.
#[derive(Debug, Clone)]
pub struct RelationalClient {
    pool: SqlitePool,
}

impl RelationalClient {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn connect_lazy(database_url: &str, max_connections: u32, acquire_timeout: Duration) -> Result<Self> {
        info!("Connecting to state database: {}", database_url);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_lazy(database_url)
            .map_err(crate::error::AppError::from)?;
        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl RelationalProbe for RelationalClient {
    async fn check_is_paused(&self) -> std::result::Result<bool, ProbeError> {
        let should_pause: bool =
            sqlx::query_scalar("SELECT should_pause FROM system_state WHERE id = 'state'")
                .fetch_one(&self.pool)
                .await?;
        Ok(should_pause)
    }
}
