use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};

use crate::config::TransformTarget;
use crate::store::{AdminDb, AppDb};
use crate::services::{ledger, mandays, projects, rates, reconcile, spending, usage};
use crate::{auth, services};

#[derive(Clone)]
pub struct AppState {
    pub app: AppDb,
    pub admin: AdminDb,
    pub http: reqwest::Client,
    pub api_key: Option<String>,
    pub transform: Option<TransformTarget>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(services::health_handler))
        // projects
        .route(
            "/projects",
            get(projects::list_projects_handler).post(projects::create_project_handler),
        )
        .route(
            "/projects/{id}",
            get(projects::get_project_handler)
                .put(projects::update_project_handler)
                .delete(projects::delete_project_handler),
        )
        .route(
            "/projects/{id}/reconcile/ledger",
            post(reconcile::reconcile_ledger_handler),
        )
        .route(
            "/projects/{id}/reconcile/mandays",
            post(reconcile::reconcile_mandays_handler),
        )
        // ledger
        .route(
            "/ledger",
            get(ledger::list_ledger_handler).post(ledger::create_ledger_entry_handler),
        )
        // role rates
        .route(
            "/role-rates",
            get(rates::list_role_rates_handler).post(rates::create_role_rate_handler),
        )
        .route(
            "/role-rates/{id}",
            put(rates::update_role_rate_handler).delete(rates::delete_role_rate_handler),
        )
        // mandays
        .route("/mandays", get(mandays::list_mandays_handler))
        .route("/mandays/import", post(mandays::import_mandays_handler))
        .route("/mandays/monthly", get(usage::monthly_mandays_handler))
        .route("/mandays/roles", get(usage::role_mandays_handler))
        // aggregated views
        .route("/spending-summary", get(spending::spending_summary_handler))
        .route("/resource-usage", get(usage::resource_usage_handler))
        .layer(from_fn_with_state(state.clone(), auth::require_api_key))
        .with_state(state)
}
