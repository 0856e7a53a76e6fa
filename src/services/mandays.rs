use axum::extract::{Json, Multipart, Query, State};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::error::ApiError;
use crate::finance::{mandays_from_hours, MONTHS};
use crate::routes::AppState;
use crate::services::{projects, require_year, ProjectScope};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MandayRecord {
    pub id: i64,
    pub project_id: Uuid,
    pub role: String,
    pub month: String,
    pub year: String,
    pub total_hours: Decimal,
    pub mandays: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct MandayQuery {
    pub project_id: Option<String>,
    pub month: Option<String>,
    pub year: Option<String>,
}

pub async fn list_mandays_handler(
    State(state): State<AppState>,
    Query(q): Query<MandayQuery>,
) -> Result<Json<Vec<MandayRecord>>, ApiError> {
    let raw = q
        .project_id
        .as_deref()
        .ok_or_else(|| ApiError::Validation("project_id is required".to_string()))?;
    let scope = ProjectScope::parse(raw)?;
    let rows = list_mandays_db(state.app.pool(), scope, q.month.as_deref(), q.year.as_deref())
        .await?;
    Ok(Json(rows))
}

pub async fn list_mandays_db(
    pool: &PgPool,
    scope: ProjectScope,
    month: Option<&str>,
    year: Option<&str>,
) -> Result<Vec<MandayRecord>, sqlx::Error> {
    let mut qb = QueryBuilder::new(
        "SELECT id, project_id, role, month, year, total_hours, mandays, created_at \
         FROM mandays WHERE 1=1",
    );
    if let ProjectScope::One(project_id) = scope {
        qb.push(" AND project_id = ");
        qb.push_bind(project_id);
    }
    if let Some(m) = month {
        qb.push(" AND month = ");
        qb.push_bind(m.to_string());
    }
    if let Some(y) = year {
        qb.push(" AND year = ");
        qb.push_bind(y.to_string());
    }
    qb.push(" ORDER BY year, month, role");

    qb.build_query_as::<MandayRecord>().fetch_all(pool).await
}

/// Row shape returned by the external CSV transform service. Everything is
/// optional: the service output is untrusted and bad rows get discarded.
#[derive(Debug, Deserialize)]
pub struct TransformRow {
    #[serde(rename = "Role")]
    pub role: Option<String>,
    #[serde(rename = "Month")]
    pub month: Option<String>,
    #[serde(rename = "TotalDuration")]
    pub total_duration: Option<f64>,
}

/// The service answers either with a bare array or wrapped in `{"data": []}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TransformResponse {
    Rows(Vec<TransformRow>),
    Wrapped { data: Vec<TransformRow> },
}

impl TransformResponse {
    pub fn into_rows(self) -> Vec<TransformRow> {
        match self {
            TransformResponse::Rows(rows) => rows,
            TransformResponse::Wrapped { data } => data,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    pub role: String,
    pub month: String,
    pub total_hours: Decimal,
}

/// Drops rows with a missing/empty role, a month outside "01".."12", or a
/// duration that is absent, non-finite or not positive.
pub fn validated_rows(rows: Vec<TransformRow>) -> Vec<ImportRow> {
    rows.into_iter()
        .filter_map(|row| {
            let role = row.role?.trim().to_string();
            let month = row.month?;
            let duration = row.total_duration?;
            if role.is_empty() || !MONTHS.contains(&month.as_str()) {
                return None;
            }
            let total_hours = Decimal::from_f64(duration)?;
            if total_hours <= Decimal::ZERO {
                return None;
            }
            Some(ImportRow {
                role,
                month,
                total_hours: total_hours.round_dp(2),
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct ImportQuery {
    pub project_id: Uuid,
    pub year: String,
}

#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub discarded: usize,
}

pub async fn import_mandays_handler(
    State(state): State<AppState>,
    Query(q): Query<ImportQuery>,
    mut multipart: Multipart,
) -> Result<Json<ImportSummary>, ApiError> {
    require_year(&q.year)?;
    let Some(transform) = state.transform.clone() else {
        return Err(ApiError::Validation(
            "manday transform service is not configured".to_string(),
        ));
    };
    projects::get_project_db(state.admin.pool(), q.project_id)
        .await?
        .ok_or(ApiError::NotFound("project"))?;

    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .unwrap_or("mandays.csv")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("invalid multipart body: {e}")))?;
            file = Some((filename, bytes.to_vec()));
        }
    }
    let (filename, bytes) =
        file.ok_or_else(|| ApiError::Validation("file field is required".to_string()))?;

    let rows = transform_file(&state.http, &transform, filename, bytes, q.project_id, &q.year)
        .await?;
    let total = rows.len();
    let valid = validated_rows(rows);
    let discarded = total - valid.len();
    if discarded > 0 {
        tracing::warn!(
            project_id = %q.project_id,
            discarded,
            "discarded malformed rows from transform service"
        );
    }
    if valid.is_empty() {
        return Err(ApiError::Validation(
            "no valid manday rows returned by the transform service".to_string(),
        ));
    }

    for row in &valid {
        upsert_manday_db(state.admin.pool(), q.project_id, &q.year, row).await?;
    }
    tracing::info!(project_id = %q.project_id, imported = valid.len(), "imported manday rows");

    Ok(Json(ImportSummary {
        imported: valid.len(),
        discarded,
    }))
}

async fn transform_file(
    http: &reqwest::Client,
    target: &crate::config::TransformTarget,
    filename: String,
    bytes: Vec<u8>,
    project_id: Uuid,
    year: &str,
) -> Result<Vec<TransformRow>, ApiError> {
    let part = reqwest::multipart::Part::bytes(bytes).file_name(filename);
    let form = reqwest::multipart::Form::new()
        .part("file", part)
        .text("projectId", project_id.to_string())
        .text("year", year.to_string());

    let mut req = http.post(&target.url).multipart(form);
    if let Some(key) = &target.api_key {
        req = req.header("x-api-key", key);
    }
    let response = req.send().await?.error_for_status()?;
    let parsed: TransformResponse = response.json().await?;
    Ok(parsed.into_rows())
}

/// Upsert key is (project, role, month, year): re-importing a month
/// overwrites that month's rows in place, other years are untouched.
pub async fn upsert_manday_db(
    pool: &PgPool,
    project_id: Uuid,
    year: &str,
    row: &ImportRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO mandays (project_id, role, month, year, total_hours, mandays)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (project_id, role, month, year)
        DO UPDATE SET total_hours = EXCLUDED.total_hours, mandays = EXCLUDED.mandays
        "#,
    )
    .bind(project_id)
    .bind(&row.role)
    .bind(&row.month)
    .bind(year)
    .bind(row.total_hours)
    .bind(mandays_from_hours(row.total_hours))
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(role: Option<&str>, month: Option<&str>, duration: Option<f64>) -> TransformRow {
        TransformRow {
            role: role.map(str::to_string),
            month: month.map(str::to_string),
            total_duration: duration,
        }
    }

    #[test]
    fn rows_missing_any_field_are_discarded() {
        let rows = validated_rows(vec![
            raw(Some("BE"), Some("04"), Some(23.38)),
            raw(None, Some("04"), Some(10.0)),
            raw(Some("QA"), None, Some(10.0)),
            raw(Some("PO"), Some("04"), None),
        ]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].role, "BE");
        assert_eq!(rows[0].total_hours, Decimal::new(2338, 2));
    }

    #[test]
    fn bad_months_and_durations_are_discarded() {
        let rows = validated_rows(vec![
            raw(Some("BE"), Some("13"), Some(8.0)),
            raw(Some("BE"), Some("4"), Some(8.0)),
            raw(Some("BE"), Some("04"), Some(0.0)),
            raw(Some("BE"), Some("04"), Some(-3.0)),
            raw(Some("BE"), Some("04"), Some(f64::NAN)),
            raw(Some(" "), Some("04"), Some(8.0)),
        ]);
        assert!(rows.is_empty());
    }

    #[test]
    fn duration_is_kept_as_hours_rounded_to_two_places() {
        let rows = validated_rows(vec![raw(Some("PO"), Some("04"), Some(67.4301))]);
        assert_eq!(rows[0].total_hours, Decimal::new(6743, 2));
        // derived at write time, 8h per manday
        assert_eq!(mandays_from_hours(rows[0].total_hours), Decimal::new(843, 2));
    }

    #[test]
    fn wrapped_and_bare_responses_both_parse() {
        let bare: TransformResponse =
            serde_json::from_str(r#"[{"Role":"FE","Month":"04","TotalDuration":7.33}]"#).unwrap();
        assert_eq!(bare.into_rows().len(), 1);
        let wrapped: TransformResponse =
            serde_json::from_str(r#"{"data":[{"Role":"FE","Month":"04","TotalDuration":7.33}]}"#)
                .unwrap();
        assert_eq!(wrapped.into_rows().len(), 1);
    }
}
