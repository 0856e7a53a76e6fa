use axum::extract::{Json, Query, State};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, QueryBuilder};

use crate::error::ApiError;
use crate::finance::usage::{
    build_usage_table, mandays_by_role, monthly_manday_usage, MonthlyMandays, RoleMandays,
    UsageRow,
};
use crate::finance::MONTHS;
use crate::routes::AppState;
use crate::services::{require_year, ProjectScope};

#[derive(Debug, Deserialize)]
pub struct UsageQuery {
    pub project_id: Option<String>,
    pub month: Option<String>,
    pub year: Option<String>,
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, ApiError> {
    value.ok_or_else(|| ApiError::Validation(format!("{name} is required")))
}

pub async fn resource_usage_handler(
    State(state): State<AppState>,
    Query(q): Query<UsageQuery>,
) -> Result<Json<Vec<UsageRow>>, ApiError> {
    let scope = ProjectScope::parse(required(q.project_id.as_deref(), "project_id")?)?;
    let year = required(q.year.as_deref(), "year")?;
    require_year(year)?;

    let manday_rows = manday_rows_db(state.app.pool(), scope, year, None).await?;
    let rates = rates_db(state.app.pool(), scope).await?;
    Ok(Json(build_usage_table(&manday_rows, &rates)))
}

pub async fn monthly_mandays_handler(
    State(state): State<AppState>,
    Query(q): Query<UsageQuery>,
) -> Result<Json<Vec<MonthlyMandays>>, ApiError> {
    let scope = ProjectScope::parse(required(q.project_id.as_deref(), "project_id")?)?;
    let year = required(q.year.as_deref(), "year")?;
    require_year(year)?;

    let rows = manday_rows_db(state.app.pool(), scope, year, None).await?;
    let by_month: Vec<(String, Decimal)> = rows
        .into_iter()
        .map(|(_, month, mandays)| (month, mandays))
        .collect();
    Ok(Json(monthly_manday_usage(&by_month)))
}

pub async fn role_mandays_handler(
    State(state): State<AppState>,
    Query(q): Query<UsageQuery>,
) -> Result<Json<Vec<RoleMandays>>, ApiError> {
    let scope = ProjectScope::parse(required(q.project_id.as_deref(), "project_id")?)?;
    let month = required(q.month.as_deref(), "month")?;
    if !MONTHS.contains(&month) {
        return Err(ApiError::Validation(format!("invalid month: {month}")));
    }
    let year = required(q.year.as_deref(), "year")?;
    require_year(year)?;

    let rows = manday_rows_db(state.app.pool(), scope, year, Some(month)).await?;
    let by_role: Vec<(String, Decimal)> = rows
        .into_iter()
        .map(|(role, _, mandays)| (role, mandays))
        .collect();
    Ok(Json(mandays_by_role(&by_role)))
}

async fn manday_rows_db(
    pool: &PgPool,
    scope: ProjectScope,
    year: &str,
    month: Option<&str>,
) -> Result<Vec<(String, String, Decimal)>, sqlx::Error> {
    let mut qb = QueryBuilder::new("SELECT role, month, mandays FROM mandays WHERE year = ");
    qb.push_bind(year.to_string());
    if let ProjectScope::One(project_id) = scope {
        qb.push(" AND project_id = ");
        qb.push_bind(project_id);
    }
    if let Some(m) = month {
        qb.push(" AND month = ");
        qb.push_bind(m.to_string());
    }
    qb.build_query_as::<(String, String, Decimal)>()
        .fetch_all(pool)
        .await
}

async fn rates_db(
    pool: &PgPool,
    scope: ProjectScope,
) -> Result<Vec<(String, Decimal)>, sqlx::Error> {
    let mut qb = QueryBuilder::new("SELECT role, cost_per_manday FROM project_role_rates WHERE 1=1");
    if let ProjectScope::One(project_id) = scope {
        qb.push(" AND project_id = ");
        qb.push_bind(project_id);
    }
    qb.build_query_as::<(String, Decimal)>()
        .fetch_all(pool)
        .await
}
