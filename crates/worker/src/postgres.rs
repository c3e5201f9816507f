//! PostgreSQL-backed selection.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::selection::{Selection, SelectionError};

/// Selection reading a persistent inventory.
///
/// The schema (`distribution_centers`, `center_items`) and its
/// population are owned elsewhere; this type only runs the read query.
#[derive(Clone)]
pub struct PgSelection {
    pool: PgPool,
}

impl PgSelection {
    /// Creates a selection over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Selection for PgSelection {
    async fn select(
        &self,
        item_id: i64,
        region: &str,
        quantity: u32,
    ) -> Result<Option<String>, SelectionError> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT dc.name FROM center_items ci
            JOIN distribution_centers dc ON dc.id = ci.center_id
            WHERE ci.item_id = $1 AND ci.quantity >= $2
            ORDER BY CASE WHEN dc.region = $3 THEN 0 ELSE 1 END, dc.id
            LIMIT 1
            "#,
        )
        .bind(item_id)
        .bind(i64::from(quantity))
        .bind(region)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(name,)| name))
    }
}
