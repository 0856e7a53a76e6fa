use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Restricted store handle for plain CRUD reads and writes. Constructed once
/// in `main` and injected through `AppState`.
#[derive(Clone)]
pub struct AppDb {
    pool: PgPool,
}

/// Privileged store handle. The aggregator, reconciliation, import and
/// health probe go through this one; it may connect with a different role
/// than `AppDb`.
#[derive(Clone)]
pub struct AdminDb {
    pool: PgPool,
}

impl AppDb {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl AdminDb {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!().run(&self.pool).await
    }
}
