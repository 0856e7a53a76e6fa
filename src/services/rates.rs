use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::AppState;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RoleRate {
    pub id: i64,
    pub project_id: Uuid,
    pub role: String,
    pub cost_per_manday: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RoleRateQuery {
    pub project_id: Option<Uuid>,
}

pub async fn list_role_rates_handler(
    State(state): State<AppState>,
    Query(q): Query<RoleRateQuery>,
) -> Result<Json<Vec<RoleRate>>, ApiError> {
    let project_id = q
        .project_id
        .ok_or_else(|| ApiError::Validation("project_id is required".to_string()))?;
    let rows = list_role_rates_db(state.app.pool(), project_id).await?;
    Ok(Json(rows))
}

pub async fn list_role_rates_db(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<Vec<RoleRate>, sqlx::Error> {
    sqlx::query_as::<_, RoleRate>(
        r#"
        SELECT id, project_id, role, cost_per_manday, created_at
        FROM project_role_rates
        WHERE project_id = $1
        ORDER BY role
        "#,
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleRateReq {
    pub project_id: Uuid,
    pub role: String,
    pub cost_per_manday: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRateReq {
    pub role: String,
    pub cost_per_manday: Decimal,
}

pub fn validate_rate(role: &str, cost_per_manday: Decimal) -> Result<(), ApiError> {
    if role.trim().is_empty() {
        return Err(ApiError::Validation("role is required".to_string()));
    }
    if cost_per_manday <= Decimal::ZERO {
        return Err(ApiError::Validation(
            "cost_per_manday must be > 0".to_string(),
        ));
    }
    Ok(())
}

pub async fn create_role_rate_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateRoleRateReq>,
) -> Result<(StatusCode, Json<RoleRate>), ApiError> {
    validate_rate(&req.role, req.cost_per_manday)?;
    let row = create_role_rate_db(state.app.pool(), &req)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err)
                if db_err.constraint() == Some("project_role_rates_project_id_fkey") =>
            {
                ApiError::NotFound("project")
            }
            e => ApiError::Store(e),
        })?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn create_role_rate_db(
    pool: &PgPool,
    req: &CreateRoleRateReq,
) -> Result<RoleRate, sqlx::Error> {
    sqlx::query_as::<_, RoleRate>(
        r#"
        INSERT INTO project_role_rates (project_id, role, cost_per_manday)
        VALUES ($1, $2, $3)
        RETURNING id, project_id, role, cost_per_manday, created_at
        "#,
    )
    .bind(req.project_id)
    .bind(req.role.trim())
    .bind(req.cost_per_manday)
    .fetch_one(pool)
    .await
}

pub async fn update_role_rate_handler(
    State(state): State<AppState>,
    Path(rate_id): Path<i64>,
    Json(req): Json<UpdateRoleRateReq>,
) -> Result<Json<RoleRate>, ApiError> {
    validate_rate(&req.role, req.cost_per_manday)?;
    let row = update_role_rate_db(state.app.pool(), rate_id, &req)
        .await?
        .ok_or(ApiError::NotFound("role rate"))?;
    Ok(Json(row))
}

pub async fn update_role_rate_db(
    pool: &PgPool,
    rate_id: i64,
    req: &UpdateRoleRateReq,
) -> Result<Option<RoleRate>, sqlx::Error> {
    sqlx::query_as::<_, RoleRate>(
        r#"
        UPDATE project_role_rates
        SET role = $2, cost_per_manday = $3
        WHERE id = $1
        RETURNING id, project_id, role, cost_per_manday, created_at
        "#,
    )
    .bind(rate_id)
    .bind(req.role.trim())
    .bind(req.cost_per_manday)
    .fetch_optional(pool)
    .await
}

pub async fn delete_role_rate_handler(
    State(state): State<AppState>,
    Path(rate_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    delete_role_rate_db(state.app.pool(), rate_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_role_rate_db(pool: &PgPool, rate_id: i64) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM project_role_rates WHERE id = $1")
        .bind(rate_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("role rate"));
    }
    Ok(())
}
