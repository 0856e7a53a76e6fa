use axum::{
    extract::{Json, Query, State},
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
pub struct LedgerEntry {
    pub id: i64,
    pub project_id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub entry_type: String,
    pub category: String,
    pub amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Credit,
    Debit,
}

impl EntryType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Credit => "credit",
            EntryType::Debit => "debit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryCategory {
    Budget,
    Mandays,
}

impl EntryCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryCategory::Budget => "budget",
            EntryCategory::Mandays => "mandays",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    pub project_id: Option<Uuid>,
}

pub async fn list_ledger_handler(
    State(state): State<AppState>,
    Query(q): Query<LedgerQuery>,
) -> Result<Json<Vec<LedgerEntry>>, ApiError> {
    let project_id = q
        .project_id
        .ok_or_else(|| ApiError::Validation("project_id is required".to_string()))?;
    let rows = list_ledger_db(state.app.pool(), project_id).await?;
    Ok(Json(rows))
}

pub async fn list_ledger_db(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<Vec<LedgerEntry>, sqlx::Error> {
    sqlx::query_as::<_, LedgerEntry>(
        r#"
        SELECT id, project_id, type, category, amount, notes, created_at
        FROM project_ledger
        WHERE project_id = $1
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

#[derive(Debug, Deserialize)]
pub struct CreateLedgerReq {
    pub project_id: Uuid,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub category: EntryCategory,
    pub amount: Decimal,
    pub notes: Option<String>,
}

pub fn validate_ledger_req(req: &CreateLedgerReq) -> Result<(), ApiError> {
    if req.amount <= Decimal::ZERO {
        return Err(ApiError::Validation("amount must be > 0".to_string()));
    }
    Ok(())
}

pub async fn create_ledger_entry_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateLedgerReq>,
) -> Result<(StatusCode, Json<LedgerEntry>), ApiError> {
    validate_ledger_req(&req)?;
    let row = create_ledger_entry_db(state.app.pool(), &req)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err)
                if db_err.constraint() == Some("project_ledger_project_id_fkey") =>
            {
                ApiError::NotFound("project")
            }
            e => ApiError::Store(e),
        })?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn create_ledger_entry_db(
    pool: &PgPool,
    req: &CreateLedgerReq,
) -> Result<LedgerEntry, sqlx::Error> {
    sqlx::query_as::<_, LedgerEntry>(
        r#"
        INSERT INTO project_ledger (project_id, type, category, amount, notes)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, project_id, type, category, amount, notes, created_at
        "#,
    )
    .bind(req.project_id)
    .bind(req.entry_type.as_str())
    .bind(req.category.as_str())
    .bind(req.amount)
    .bind(&req.notes)
    .fetch_one(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_must_be_positive() {
        let mut req = CreateLedgerReq {
            project_id: Uuid::new_v4(),
            entry_type: EntryType::Debit,
            category: EntryCategory::Budget,
            amount: Decimal::from(20_000),
            notes: None,
        };
        assert!(validate_ledger_req(&req).is_ok());
        req.amount = Decimal::ZERO;
        assert!(validate_ledger_req(&req).is_err());
        req.amount = Decimal::from(-5);
        assert!(validate_ledger_req(&req).is_err());
    }

    #[test]
    fn wire_labels_are_lowercase() {
        assert_eq!(EntryType::Credit.as_str(), "credit");
        assert_eq!(EntryCategory::Mandays.as_str(), "mandays");
        let parsed: EntryType = serde_json::from_str("\"debit\"").unwrap();
        assert_eq!(parsed, EntryType::Debit);
        assert!(serde_json::from_str::<EntryCategory>("\"equipment\"").is_err());
    }
}
