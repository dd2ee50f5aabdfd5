//! PostgreSQL implementation of the click repository.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::entities::ClickInfo;
use crate::domain::repositories::ClickRepository;
use crate::error::AppError;

/// Appends enriched click records to the `clicks` table.
pub struct PgClickRepository {
    pool: Arc<PgPool>,
}

impl PgClickRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClickRepository for PgClickRepository {
    async fn record(&self, click: ClickInfo) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO clicks (short_url_id, country, ip, referrer, browser, platform, clicked_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&click.short_url_id)
        .bind(&click.country)
        .bind(&click.ip)
        .bind(&click.referrer)
        .bind(&click.browser)
        .bind(&click.platform)
        .bind(click.timestamp)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }
}
