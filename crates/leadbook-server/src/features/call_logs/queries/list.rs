//! List call logs query
//!
//! `startDate`/`endDate` accept RFC 3339 timestamps or plain `YYYY-MM-DD`
//! dates. A plain end date covers the whole day.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::features::call_logs::types::{CallLog, CallType, SimProvider, CALL_LOG_COLUMNS};
use crate::features::shared::enums::SortOrder;
use crate::features::shared::pagination::{ListResponse, PageMeta, PageParams};
use crate::features::shared::sql::{contains_pattern, non_blank};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallLogSortField {
    #[default]
    CallTime,
    CreatedAt,
    Duration,
    Name,
}

impl CallLogSortField {
    fn column(self) -> &'static str {
        match self {
            CallLogSortField::CallTime => "call_time",
            CallLogSortField::CreatedAt => "created_at",
            CallLogSortField::Duration => "duration",
            CallLogSortField::Name => "name",
        }
    }
}

/// Query string of `GET /api/call-logs`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCallLogsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub call_type: Option<CallType>,
    pub user_email: Option<String>,
    pub sim_provider: Option<SimProvider>,
    pub search: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub sort_by: Option<CallLogSortField>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CallLogStats {
    pub total: i64,
    pub incoming: i64,
    pub outgoing: i64,
    pub missed: i64,
    pub unanswered: i64,
}

pub type ListCallLogsResponse = ListResponse<CallLog, CallLogStats>;

#[derive(Debug, thiserror::Error)]
pub enum ListCallLogsError {
    #[error("{0}")]
    InvalidPagination(&'static str),
    #[error("{field} must be an ISO-8601 date or timestamp, got '{value}'")]
    InvalidDate { field: &'static str, value: String },
    #[error("startDate must not be after endDate")]
    InvertedRange,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Resolved `call_time` window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CallTimeRange {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

fn parse_bound(
    field: &'static str,
    value: &str,
    end_of_day: bool,
) -> Result<DateTime<Utc>, ListCallLogsError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        ListCallLogsError::InvalidDate {
            field,
            value: value.to_string(),
        }
    })?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    };
    time.map(|t| date.and_time(t).and_utc())
        .ok_or_else(|| ListCallLogsError::InvalidDate {
            field,
            value: value.to_string(),
        })
}

impl ListCallLogsQuery {
    pub fn pagination(&self) -> PageParams {
        PageParams {
            page: self.page,
            limit: self.limit,
        }
    }

    fn call_time_range(&self) -> Result<CallTimeRange, ListCallLogsError> {
        let start = non_blank(self.start_date.as_deref())
            .map(|v| parse_bound("startDate", v, false))
            .transpose()?;
        let end = non_blank(self.end_date.as_deref())
            .map(|v| parse_bound("endDate", v, true))
            .transpose()?;
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(ListCallLogsError::InvertedRange);
            }
        }
        Ok(CallTimeRange { start, end })
    }

    pub fn validate(&self) -> Result<(), ListCallLogsError> {
        self.pagination()
            .validate()
            .map_err(ListCallLogsError::InvalidPagination)?;
        self.call_time_range()?;
        Ok(())
    }

    fn push_filters<'a>(
        &'a self,
        builder: &mut QueryBuilder<'a, Postgres>,
        range: CallTimeRange,
        with_call_type: bool,
    ) {
        if with_call_type {
            if let Some(call_type) = self.call_type {
                builder.push(" AND call_type = ").push_bind(call_type.as_str());
            }
        }
        if let Some(email) = non_blank(self.user_email.as_deref()) {
            builder.push(" AND user_email = ").push_bind(email);
        }
        if let Some(sim) = self.sim_provider {
            builder.push(" AND sim_provider = ").push_bind(sim.as_str());
        }
        if let Some(search) = non_blank(self.search.as_deref()) {
            let pattern = contains_pattern(search);
            builder
                .push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR phone_number LIKE ")
                .push_bind(pattern.clone())
                .push(" OR user_email ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(start) = range.start {
            builder.push(" AND call_time >= ").push_bind(start);
        }
        if let Some(end) = range.end {
            builder.push(" AND call_time <= ").push_bind(end);
        }
    }

    fn select_page(&self, range: CallTimeRange) -> QueryBuilder<'_, Postgres> {
        let page = self.pagination();
        let order = self.sort_order.unwrap_or_default().as_sql();
        let column = self.sort_by.unwrap_or_default().column();

        let mut builder =
            QueryBuilder::new(format!("SELECT {CALL_LOG_COLUMNS} FROM call_logs WHERE TRUE"));
        self.push_filters(&mut builder, range, true);
        builder.push(format!(" ORDER BY {column} {order}, id {order}"));
        builder.push(" LIMIT ").push_bind(page.limit());
        builder.push(" OFFSET ").push_bind(page.offset());
        builder
    }

    fn select_count(&self, range: CallTimeRange) -> QueryBuilder<'_, Postgres> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM call_logs WHERE TRUE");
        self.push_filters(&mut builder, range, true);
        builder
    }

    fn select_stats(&self, range: CallTimeRange) -> QueryBuilder<'_, Postgres> {
        let mut builder = QueryBuilder::new(
            "SELECT COUNT(*) AS total, \
             COUNT(*) FILTER (WHERE call_type = 'INCOMING') AS incoming, \
             COUNT(*) FILTER (WHERE call_type = 'OUTGOING') AS outgoing, \
             COUNT(*) FILTER (WHERE call_type = 'MISSED') AS missed, \
             COUNT(*) FILTER (WHERE call_type = 'UNANSWERED') AS unanswered \
             FROM call_logs WHERE TRUE",
        );
        self.push_filters(&mut builder, range, false);
        builder
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: &PgPool,
    query: ListCallLogsQuery,
) -> Result<ListCallLogsResponse, ListCallLogsError> {
    query.validate()?;
    let range = query.call_time_range()?;

    let data = query
        .select_page(range)
        .build_query_as::<CallLog>()
        .fetch_all(pool)
        .await?;
    let total: i64 = query
        .select_count(range)
        .build_query_scalar()
        .fetch_one(pool)
        .await?;
    let stats = query
        .select_stats(range)
        .build_query_as::<CallLogStats>()
        .fetch_one(pool)
        .await?;

    tracing::debug!(returned = data.len(), total, "Call logs fetched");

    Ok(ListResponse {
        data,
        meta: PageMeta::new(&query.pagination(), total),
        stats,
    })
}
