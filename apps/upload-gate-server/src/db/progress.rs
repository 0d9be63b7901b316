//! Upload progress database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{AppError, Result};
use crate::progress::ProgressStore;
use crate::upload::SessionStatus;

/// SQLite-backed progress store; survives restarts
#[derive(Clone)]
pub struct SqliteProgressStore {
    pool: SqlitePool,
}

impl SqliteProgressStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn to_db(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| AppError::Internal(format!("Progress value {} overflows", value)))
}

#[async_trait]
impl ProgressStore for SqliteProgressStore {
    async fn get(&self, upload_id: &str) -> Result<Option<u64>> {
        let bytes = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT uploaded_bytes FROM upload_progress
            WHERE upload_id = ? AND status = 'active'
            "#,
        )
        .bind(upload_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bytes.map(|b| b.max(0) as u64))
    }

    async fn put(&self, upload_id: &str, uploaded_bytes: u64) -> Result<()> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO upload_progress (upload_id, uploaded_bytes, status, created_at, updated_at)
            VALUES (?, ?, 'active', ?, ?)
            ON CONFLICT(upload_id) DO UPDATE SET
                uploaded_bytes = excluded.uploaded_bytes,
                status = 'active',
                updated_at = excluded.updated_at
            "#,
        )
        .bind(upload_id)
        .bind(to_db(uploaded_bytes)?)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn put_if(&self, upload_id: &str, expected: u64, uploaded_bytes: u64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE upload_progress
            SET uploaded_bytes = ?, updated_at = ?
            WHERE upload_id = ? AND uploaded_bytes = ? AND status = 'active'
            "#,
        )
        .bind(to_db(uploaded_bytes)?)
        .bind(Utc::now().to_rfc3339())
        .bind(upload_id)
        .bind(to_db(expected)?)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn finish(&self, upload_id: &str, status: SessionStatus) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE upload_progress
            SET status = ?, updated_at = ?
            WHERE upload_id = ? AND status = 'active'
            "#,
        )
        .bind(status.as_str())
        .bind(&now)
        .bind(upload_id)
        .execute(&mut *tx)
        .await?;

        let was_active = updated.rows_affected() == 1;
        if !was_active {
            // Record the outcome for ids this store never saw
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO upload_progress (upload_id, uploaded_bytes, status, created_at, updated_at)
                VALUES (?, 0, ?, ?, ?)
                "#,
            )
            .bind(upload_id)
            .bind(status.as_str())
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(was_active)
    }

    async fn status(&self, upload_id: &str) -> Result<Option<SessionStatus>> {
        let status = sqlx::query_scalar::<_, String>(
            r#"
            SELECT status FROM upload_progress WHERE upload_id = ?
            "#,
        )
        .bind(upload_id)
        .fetch_optional(&self.pool)
        .await?;

        status
            .map(|s| {
                SessionStatus::parse(&s)
                    .ok_or_else(|| AppError::Internal(format!("Unknown session status {:?}", s)))
            })
            .transpose()
    }

    async fn delete(&self, upload_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM upload_progress WHERE upload_id = ?
            "#,
        )
        .bind(upload_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
