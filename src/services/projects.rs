use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::AppState;

/// `spent`, `burn_rate`, `mandays_allocated` and `mandays_consumed` are a
/// materialized snapshot: only the reconciliation endpoints rewrite them,
/// so they lag the ledger and the manday table until the next reconcile.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub department: Option<String>,
    pub status: String,
    pub budget: Decimal,
    pub spent: Decimal,
    pub burn_rate: Decimal,
    pub mandays_allocated: Decimal,
    pub mandays_consumed: Decimal,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    Active,
    OnHold,
    AtRisk,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::OnHold => "on-hold",
            ProjectStatus::AtRisk => "at-risk",
            ProjectStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProjectReq {
    pub name: String,
    pub department: Option<String>,
    pub status: Option<ProjectStatus>,
    pub budget: Option<Decimal>,
    pub mandays_allocated: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

pub fn validate_project_req(req: &ProjectReq) -> Result<(), ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("name is required".to_string()));
    }
    if req.budget.is_some_and(|b| b < Decimal::ZERO) {
        return Err(ApiError::Validation("budget must be >= 0".to_string()));
    }
    if req.mandays_allocated.is_some_and(|m| m < Decimal::ZERO) {
        return Err(ApiError::Validation(
            "mandays_allocated must be >= 0".to_string(),
        ));
    }
    Ok(())
}

pub async fn list_projects_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Project>>, ApiError> {
    let rows = list_projects_db(state.app.pool()).await?;
    Ok(Json(rows))
}

pub async fn list_projects_db(pool: &PgPool) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        r#"
        SELECT *
        FROM projects
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn get_project_handler(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Project>, ApiError> {
    let row = get_project_db(state.app.pool(), project_id)
        .await?
        .ok_or(ApiError::NotFound("project"))?;
    Ok(Json(row))
}

pub async fn get_project_db(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        r#"
        SELECT *
        FROM projects
        WHERE id = $1
        "#,
    )
    .bind(project_id)
    .fetch_optional(pool)
    .await
}

pub async fn create_project_handler(
    State(state): State<AppState>,
    Json(req): Json<ProjectReq>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    validate_project_req(&req)?;
    let row = create_project_db(state.app.pool(), &req).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn create_project_db(pool: &PgPool, req: &ProjectReq) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        r#"
        INSERT INTO projects
            (name, department, status, budget, mandays_allocated, start_date, end_date, description)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(req.name.trim())
    .bind(&req.department)
    .bind(req.status.unwrap_or(ProjectStatus::Active).as_str())
    .bind(req.budget.unwrap_or(Decimal::ZERO))
    .bind(req.mandays_allocated.unwrap_or(Decimal::ZERO))
    .bind(req.start_date)
    .bind(req.end_date)
    .bind(&req.description)
    .fetch_one(pool)
    .await
}

pub async fn update_project_handler(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<ProjectReq>,
) -> Result<Json<Project>, ApiError> {
    validate_project_req(&req)?;
    let row = update_project_db(state.app.pool(), project_id, &req)
        .await?
        .ok_or(ApiError::NotFound("project"))?;
    Ok(Json(row))
}

/// The edit form never touches the reconciled fields; `spent`, `burn_rate`
/// and `mandays_consumed` stay whatever the last reconciliation wrote.
pub async fn update_project_db(
    pool: &PgPool,
    project_id: Uuid,
    req: &ProjectReq,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        r#"
        UPDATE projects
        SET name = $2,
            department = $3,
            status = $4,
            budget = $5,
            mandays_allocated = $6,
            start_date = $7,
            end_date = $8,
            description = $9
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(project_id)
    .bind(req.name.trim())
    .bind(&req.department)
    .bind(req.status.unwrap_or(ProjectStatus::Active).as_str())
    .bind(req.budget.unwrap_or(Decimal::ZERO))
    .bind(req.mandays_allocated.unwrap_or(Decimal::ZERO))
    .bind(req.start_date)
    .bind(req.end_date)
    .bind(&req.description)
    .fetch_optional(pool)
    .await
}

pub async fn delete_project_handler(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    delete_project_db(state.app.pool(), project_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Manday rows go first, then the project, in one transaction; a project
/// with no manday rows deletes trivially. Ledger entries and role rates
/// cascade in the schema.
pub async fn delete_project_db(pool: &PgPool, project_id: Uuid) -> Result<(), ApiError> {
    let mut tx: Transaction<'_, Postgres> = pool.begin().await?;
    sqlx::query("DELETE FROM mandays WHERE project_id = $1")
        .bind(project_id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(project_id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("project"));
    }
    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(name: &str) -> ProjectReq {
        ProjectReq {
            name: name.to_string(),
            department: None,
            status: None,
            budget: None,
            mandays_allocated: None,
            start_date: None,
            end_date: None,
            description: None,
        }
    }

    #[test]
    fn name_is_required() {
        assert!(validate_project_req(&req("Website Redesign")).is_ok());
        assert!(validate_project_req(&req("")).is_err());
        assert!(validate_project_req(&req("   ")).is_err());
    }

    #[test]
    fn budget_must_not_be_negative() {
        let mut r = req("ERP Upgrade");
        r.budget = Some(Decimal::from(-1));
        assert!(validate_project_req(&r).is_err());
        r.budget = Some(Decimal::ZERO);
        assert!(validate_project_req(&r).is_ok());
    }

    #[test]
    fn status_uses_kebab_case_labels() {
        assert_eq!(ProjectStatus::OnHold.as_str(), "on-hold");
        let parsed: ProjectStatus = serde_json::from_str("\"at-risk\"").unwrap();
        assert_eq!(parsed, ProjectStatus::AtRisk);
        assert!(serde_json::from_str::<ProjectStatus>("\"cancelled\"").is_err());
    }
}
