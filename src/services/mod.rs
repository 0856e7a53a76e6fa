pub mod ledger;
pub mod mandays;
pub mod projects;
pub mod rates;
pub mod reconcile;
pub mod spending;
pub mod usage;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::AppState;

/// Filter target for manday-backed queries: one project, or every project
/// (the literal `all`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectScope {
    All,
    One(Uuid),
}

impl ProjectScope {
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        if raw == "all" {
            return Ok(ProjectScope::All);
        }
        Uuid::parse_str(raw)
            .map(ProjectScope::One)
            .map_err(|_| ApiError::Validation(format!("invalid project id: {raw}")))
    }
}

pub fn require_year(year: &str) -> Result<(), ApiError> {
    if year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ApiError::Validation(format!("invalid year: {year}")))
    }
}

pub async fn health_handler(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let project_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects")
        .fetch_one(state.admin.pool())
        .await?;
    Ok(Json(json!({ "status": "ok", "project_count": project_count })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_parses_all_and_uuids() {
        assert_eq!(ProjectScope::parse("all").unwrap(), ProjectScope::All);
        let id = Uuid::new_v4();
        assert_eq!(
            ProjectScope::parse(&id.to_string()).unwrap(),
            ProjectScope::One(id)
        );
        assert!(ProjectScope::parse("proj-001").is_err());
    }

    #[test]
    fn year_must_be_four_digits() {
        assert!(require_year("2024").is_ok());
        assert!(require_year("24").is_err());
        assert!(require_year("twenty").is_err());
        assert!(require_year("20245").is_err());
    }
}
