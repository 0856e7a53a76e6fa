use axum::extract::{Json, Query, State};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::finance::spend::{
    manday_costs, summarize, summary_row, SpendingParts, SpendingSummaryRow,
};
use crate::routes::AppState;
use crate::store::AdminDb;

#[derive(Debug, Deserialize)]
pub struct SpendingQuery {
    pub project_id: Option<Uuid>,
}

pub async fn spending_summary_handler(
    State(state): State<AppState>,
    Query(q): Query<SpendingQuery>,
) -> Result<Json<Vec<SpendingSummaryRow>>, ApiError> {
    let rows = spending_summary(&state.admin, q.project_id).await?;
    Ok(Json(rows))
}

/// Both paths reduce to `SpendingParts` and share `summarize`: the
/// `project_spending` view is just a cheaper way to load the same raw
/// inputs, and results are identical either way. Projects come back in
/// creation order.
pub async fn spending_summary(
    db: &AdminDb,
    project: Option<Uuid>,
) -> Result<Vec<SpendingSummaryRow>, ApiError> {
    match load_view_rows(db.pool(), project).await {
        Ok(rows) => Ok(rows
            .into_iter()
            .map(|row| {
                summarize(
                    row.project_id,
                    &row.project_name,
                    &SpendingParts {
                        budget: row.budget,
                        manday_costs: row.manday_costs,
                        ledger_costs: row.ledger_costs,
                    },
                )
            })
            .collect()),
        Err(e) => {
            tracing::warn!("project_spending view unavailable, recomputing from base tables: {e}");
            manual_summary(db.pool(), project).await
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SpendingViewRow {
    project_id: Uuid,
    project_name: String,
    budget: Decimal,
    manday_costs: Decimal,
    ledger_costs: Decimal,
}

async fn load_view_rows(
    pool: &PgPool,
    project: Option<Uuid>,
) -> Result<Vec<SpendingViewRow>, sqlx::Error> {
    match project {
        Some(project_id) => {
            sqlx::query_as::<_, SpendingViewRow>(
                r#"
                SELECT project_id, project_name, budget, manday_costs, ledger_costs
                FROM project_spending
                WHERE project_id = $1
                "#,
            )
            .bind(project_id)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, SpendingViewRow>(
                r#"
                SELECT project_id, project_name, budget, manday_costs, ledger_costs
                FROM project_spending
                ORDER BY created_at
                "#,
            )
            .fetch_all(pool)
            .await
        }
    }
}

/// Fallback: the three-way join done by hand, one project at a time. A
/// project whose reads fail turns into a zero row, the batch keeps going.
async fn manual_summary(
    pool: &PgPool,
    project: Option<Uuid>,
) -> Result<Vec<SpendingSummaryRow>, ApiError> {
    let projects: Vec<(Uuid, String, Decimal)> = match project {
        Some(project_id) => {
            sqlx::query_as("SELECT id, name, budget FROM projects WHERE id = $1")
                .bind(project_id)
                .fetch_all(pool)
                .await?
        }
        None => {
            sqlx::query_as("SELECT id, name, budget FROM projects ORDER BY created_at")
                .fetch_all(pool)
                .await?
        }
    };

    let mut out = Vec::with_capacity(projects.len());
    for (project_id, name, budget) in projects {
        let parts = load_parts_join(pool, project_id, budget).await;
        out.push(summary_row(project_id, &name, parts));
    }
    Ok(out)
}

async fn load_parts_join(
    pool: &PgPool,
    project_id: Uuid,
    budget: Decimal,
) -> Result<SpendingParts, ApiError> {
    let rates: Vec<(String, Decimal)> = sqlx::query_as(
        "SELECT role, cost_per_manday FROM project_role_rates WHERE project_id = $1",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    let mandays: Vec<(String, Decimal)> =
        sqlx::query_as("SELECT role, mandays FROM mandays WHERE project_id = $1")
            .bind(project_id)
            .fetch_all(pool)
            .await?;

    let debits: Vec<Decimal> = sqlx::query_scalar(
        "SELECT amount FROM project_ledger \
         WHERE project_id = $1 AND type = 'debit' AND category = 'budget'",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    Ok(SpendingParts {
        budget,
        manday_costs: manday_costs(&rates, &mandays),
        ledger_costs: debits.into_iter().sum(),
    })
}
