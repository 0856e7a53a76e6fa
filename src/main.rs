mod auth;
mod config;
mod error;
mod finance;
mod routes;
mod services;
mod store;

use tracing_subscriber::EnvFilter;

use crate::routes::AppState;
use crate::store::{AdminDb, AppDb};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    if std::env::var("ENV").ok().as_deref() != Some("prod") {
        dotenvy::dotenv().ok();
    }
    let cfg = config::Config::from_env()?;

    let app_db = AppDb::connect(&cfg.database_url, cfg.pg_max_connections).await?;
    let admin_db = AdminDb::connect(&cfg.admin_database_url, cfg.pg_max_connections).await?;
    admin_db.run_migrations().await?;

    let state = AppState {
        app: app_db,
        admin: admin_db,
        http: reqwest::Client::new(),
        api_key: cfg.api_key.clone(),
        transform: cfg.transform.clone(),
    };
    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
