use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::Config;

/// Embedded schema migrations (`migrations/`).
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn with_max_connections(
        database_url: &str,
        max_connections: u32,
    ) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Connects using the pool size from `config` and applies migrations when
    /// `config.run_migrations` is set.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let db = Self::with_max_connections(&config.database_url, config.db_max_connections)
            .await?;
        if config.run_migrations {
            db.migrate().await?;
        }
        Ok(db)
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        MIGRATOR.run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    /// Cheap liveness probe used by the health endpoint.
    pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
    }
}
