//! Postgres implementation of the audit log store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::models::{AuditFilter, AuditRecord, NewAuditRecord};
use super::store::{AuditLogStore, AuditStoreError};

const RECORD_COLUMNS: &str = "id, action, method, url, status_code, duration, ip, user_agent, \
                              details, user_id, created_at";

#[derive(Clone)]
pub struct PgAuditLogStore {
    pool: PgPool,
}

impl PgAuditLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogStore for PgAuditLogStore {
    async fn insert(&self, record: NewAuditRecord) -> Result<AuditRecord, AuditStoreError> {
        let sql = format!(
            r#"
            INSERT INTO audit_log (
                action, method, url, status_code, duration, ip, user_agent, details, user_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {RECORD_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, AuditRecord>(&sql)
            .bind(&record.action)
            .bind(&record.method)
            .bind(&record.url)
            .bind(record.status_code)
            .bind(&record.duration)
            .bind(&record.ip)
            .bind(&record.user_agent)
            .bind(&record.details)
            .bind(&record.user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    async fn find_all(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditStoreError> {
        let mut sql = format!("SELECT {RECORD_COLUMNS} FROM audit_log");
        let mut bind_count = 1;

        if filter.action.is_some() {
            sql.push_str(&format!(" WHERE action = ${}", bind_count));
            bind_count += 1;
        }

        sql.push_str(" ORDER BY created_at DESC, id DESC");
        sql.push_str(&format!(" LIMIT ${} OFFSET ${}", bind_count, bind_count + 1));

        let mut query = sqlx::query_as::<_, AuditRecord>(&sql);
        if let Some(action) = &filter.action {
            query = query.bind(action);
        }

        let rows = query
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn find_by_actor(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<AuditRecord>, AuditStoreError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM audit_log WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        );

        let rows = sqlx::query_as::<_, AuditRecord>(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn count_by_action(&self, action: &str) -> Result<i64, AuditStoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_log WHERE action = $1")
            .bind(action)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, AuditStoreError> {
        let result = sqlx::query("DELETE FROM audit_log WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
