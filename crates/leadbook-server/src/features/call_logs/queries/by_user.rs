//! Call logs of one agent, newest call first

use sqlx::PgPool;

use crate::features::call_logs::types::{CallLog, CALL_LOG_COLUMNS};

pub const DEFAULT_USER_LIMIT: i64 = 100;

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: &PgPool,
    user_email: &str,
    limit: Option<i64>,
) -> Result<Vec<CallLog>, sqlx::Error> {
    let limit = limit.unwrap_or(DEFAULT_USER_LIMIT).clamp(1, 1000);
    sqlx::query_as::<_, CallLog>(&format!(
        "SELECT {CALL_LOG_COLUMNS} FROM call_logs WHERE user_email = $1 \
         ORDER BY call_time DESC, id DESC LIMIT $2"
    ))
    .bind(user_email)
    .bind(limit)
    .fetch_all(pool)
    .await
}
