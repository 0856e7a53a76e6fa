use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_url: String,
    pub admin_database_url: String,
    pub pg_max_connections: u32,
    pub api_key: Option<String>,
    pub transform: Option<TransformTarget>,
}

/// External CSV-to-manday transform service (reached over HTTP).
#[derive(Debug, Clone)]
pub struct TransformTarget {
    pub url: String,
    pub api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        // Admin connection falls back to the app connection when no separate
        // privileged role is configured.
        let admin_database_url =
            std::env::var("ADMIN_DATABASE_URL").unwrap_or_else(|_| database_url.clone());
        let transform = std::env::var("TRANSFORM_URL").ok().map(|url| TransformTarget {
            url,
            api_key: std::env::var("TRANSFORM_API_KEY").ok(),
        });
        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            database_url,
            admin_database_url,
            pg_max_connections: std::env::var("PG_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            api_key: std::env::var("API_KEY").ok(),
            transform,
        })
    }
}
