//! List leads query
//!
//! Filtered, sorted and paginated. The response carries per-status counts
//! over the same filters minus `status`, so the dashboard tabs keep their
//! totals while one of them is selected.

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::features::leads::types::{
    Lead, LeadSource, LeadStage, LeadStatus, Priority, LEAD_COLUMNS,
};
use crate::features::shared::enums::SortOrder;
use crate::features::shared::pagination::{ListResponse, PageMeta, PageParams};
use crate::features::shared::sql::{contains_pattern, non_blank};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeadSortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    LeadName,
    City,
    Priority,
    Stage,
    Status,
}

impl LeadSortField {
    fn column(self) -> &'static str {
        match self {
            LeadSortField::CreatedAt => "created_at",
            LeadSortField::UpdatedAt => "updated_at",
            LeadSortField::LeadName => "lead_name",
            LeadSortField::City => "city",
            LeadSortField::Priority => "priority",
            LeadSortField::Stage => "stage",
            LeadSortField::Status => "status",
        }
    }
}

/// Query string of `GET /api/leads`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLeadsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub priority: Option<Priority>,
    pub stage: Option<LeadStage>,
    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,
    pub city: Option<String>,
    pub owner: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<LeadSortField>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeadStats {
    pub total: i64,
    pub new: i64,
    pub connected: i64,
    pub demo_done: i64,
    pub closed_won: i64,
    pub lost: i64,
    pub follow_up: i64,
}

pub type ListLeadsResponse = ListResponse<Lead, LeadStats>;

#[derive(Debug, thiserror::Error)]
pub enum ListLeadsError {
    #[error("{0}")]
    InvalidPagination(&'static str),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ListLeadsQuery {
    pub fn pagination(&self) -> PageParams {
        PageParams {
            page: self.page,
            limit: self.limit,
        }
    }

    pub fn validate(&self) -> Result<(), ListLeadsError> {
        self.pagination()
            .validate()
            .map_err(ListLeadsError::InvalidPagination)
    }

    /// Appends ` AND ...` for every active filter. `status` is skipped when
    /// `with_status` is false.
    fn push_filters<'a>(&'a self, builder: &mut QueryBuilder<'a, Postgres>, with_status: bool) {
        if let Some(priority) = self.priority {
            builder.push(" AND priority = ").push_bind(priority.as_str());
        }
        if let Some(stage) = self.stage {
            builder.push(" AND stage = ").push_bind(stage.as_str());
        }
        if with_status {
            if let Some(status) = self.status {
                builder.push(" AND status = ").push_bind(status.as_str());
            }
        }
        if let Some(source) = self.source {
            builder.push(" AND source = ").push_bind(source.as_str());
        }
        if let Some(city) = non_blank(self.city.as_deref()) {
            builder.push(" AND LOWER(city) = LOWER(").push_bind(city).push(")");
        }
        if let Some(owner) = non_blank(self.owner.as_deref()) {
            builder.push(" AND LOWER(owner) = LOWER(").push_bind(owner).push(")");
        }
        if let Some(search) = non_blank(self.search.as_deref()) {
            let pattern = contains_pattern(search);
            builder.push(" AND (");
            let mut any = builder.separated(" OR ");
            for column in ["lead_name", "institution", "phone_number", "city", "owner"] {
                any.push(format!("{column} ILIKE "))
                    .push_bind_unseparated(pattern.clone());
            }
            builder.push(")");
        }
    }

    fn select_page(&self) -> QueryBuilder<'_, Postgres> {
        let page = self.pagination();
        let order = self.sort_order.unwrap_or_default().as_sql();
        let column = self.sort_by.unwrap_or_default().column();

        let mut builder = QueryBuilder::new(format!("SELECT {LEAD_COLUMNS} FROM leads WHERE TRUE"));
        self.push_filters(&mut builder, true);
        builder.push(format!(" ORDER BY {column} {order}, id {order}"));
        builder.push(" LIMIT ").push_bind(page.limit());
        builder.push(" OFFSET ").push_bind(page.offset());
        builder
    }

    fn select_count(&self) -> QueryBuilder<'_, Postgres> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM leads WHERE TRUE");
        self.push_filters(&mut builder, true);
        builder
    }

    fn select_stats(&self) -> QueryBuilder<'_, Postgres> {
        let mut builder = QueryBuilder::new(
            "SELECT COUNT(*) AS total, \
             COUNT(*) FILTER (WHERE status = 'NEW') AS \"new\", \
             COUNT(*) FILTER (WHERE status = 'CONNECTED') AS connected, \
             COUNT(*) FILTER (WHERE status = 'DEMO_DONE') AS demo_done, \
             COUNT(*) FILTER (WHERE status = 'CLOSED_WON') AS closed_won, \
             COUNT(*) FILTER (WHERE status = 'LOST') AS lost, \
             COUNT(*) FILTER (WHERE status = 'FOLLOW_UP') AS follow_up \
             FROM leads WHERE TRUE",
        );
        self.push_filters(&mut builder, false);
        builder
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: &PgPool, query: ListLeadsQuery) -> Result<ListLeadsResponse, ListLeadsError> {
    query.validate()?;

    let data = query.select_page().build_query_as::<Lead>().fetch_all(pool).await?;
    let total: i64 = query.select_count().build_query_scalar().fetch_one(pool).await?;
    let stats = query
        .select_stats()
        .build_query_as::<LeadStats>()
        .fetch_one(pool)
        .await?;

    Ok(ListResponse {
        data,
        meta: PageMeta::new(&query.pagination(), total),
        stats,
    })
}
