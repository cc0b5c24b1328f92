use std::net::SocketAddr;
use std::sync::Arc;

use service_areas_api::config::Config;
use service_areas_api::db::Database;
use service_areas_api::handlers::AppState;
use service_areas_api::{obs, routes};

/// Main entry point for the application.
///
/// Initializes tracing, loads configuration, connects to the database
/// (applying migrations when enabled), builds the router and serves it.
///
/// # Returns
///
/// * `anyhow::Result<()>` - Ok if the server runs successfully, or an error if initialization fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    obs::init_tracing();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize database connection pool
    let db = Database::from_config(&config).await?;
    tracing::info!("Database connection pool established");

    let port = config.port;
    let app_state = Arc::new(AppState::new(db.pool.clone(), config)?);
    let app = routes::app(app_state)?;

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
