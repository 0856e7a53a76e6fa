use axum::extract::{Json, Path, State};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::finance::spend::{burn_rate, ledger_totals};
use crate::routes::AppState;
use crate::services::projects::Project;

pub async fn reconcile_ledger_handler(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Project>, ApiError> {
    let project = reconcile_from_ledger_db(state.admin.pool(), project_id).await?;
    tracing::info!(project_id = %project_id, "reconciled project totals from ledger");
    Ok(Json(project))
}

/// Rebuilds all four denormalized totals from the ledger and overwrites
/// them in a single statement, plus a burn-rate snapshot from the new
/// figures. Re-running against unchanged rows writes the same totals.
pub async fn reconcile_from_ledger_db(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<Project, ApiError> {
    let rows: Vec<(String, String, Decimal)> =
        sqlx::query_as("SELECT type, category, amount FROM project_ledger WHERE project_id = $1")
            .bind(project_id)
            .fetch_all(pool)
            .await?;
    let totals = ledger_totals(&rows);

    sqlx::query_as::<_, Project>(
        r#"
        UPDATE projects
        SET budget = $2,
            spent = $3,
            mandays_allocated = $4,
            mandays_consumed = $5,
            burn_rate = $6
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(project_id)
    .bind(totals.budget)
    .bind(totals.spent)
    .bind(totals.mandays_allocated)
    .bind(totals.mandays_consumed)
    .bind(burn_rate(totals.spent, totals.budget))
    .fetch_optional(pool)
    .await?
    .ok_or(ApiError::NotFound("project"))
}

pub async fn reconcile_mandays_handler(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Project>, ApiError> {
    let project = reconcile_from_mandays_db(state.admin.pool(), project_id).await?;
    tracing::info!(project_id = %project_id, "reconciled mandays_consumed from manday rows");
    Ok(Json(project))
}

/// Only touches `mandays_consumed`; the ledger-owned fields keep whatever
/// the last ledger reconciliation wrote.
pub async fn reconcile_from_mandays_db(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<Project, ApiError> {
    let rows: Vec<Decimal> =
        sqlx::query_scalar("SELECT mandays FROM mandays WHERE project_id = $1")
            .bind(project_id)
            .fetch_all(pool)
            .await?;
    let consumed: Decimal = rows.into_iter().sum();

    sqlx::query_as::<_, Project>(
        r#"
        UPDATE projects
        SET mandays_consumed = $2
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(project_id)
    .bind(consumed)
    .fetch_optional(pool)
    .await?
    .ok_or(ApiError::NotFound("project"))
}
