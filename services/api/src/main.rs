use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use api::{
    AppState,
    broadcaster::Broadcaster,
    config::ServerConfig,
    create_router,
    jwt::{JwtConfig, JwtService},
    repositories::{PgBetRepository, PgUserRepository},
    sweeper::ExpirySweeper,
};
use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting API service");

    let server_config = ServerConfig::load()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool).await?;

    let jwt_service = JwtService::new(JwtConfig::from_env()?);
    let broadcaster = Arc::new(Broadcaster::new(server_config.broadcast_queue_capacity));

    let app_state = AppState::new(
        jwt_service,
        Arc::new(PgUserRepository::new(pool.clone())),
        Arc::new(PgBetRepository::new(pool)),
        broadcaster,
    );

    // Reads fall through to the database until the buckets load.
    if let Err(e) = app_state.bets.cache().warm().await {
        warn!("Bet cache warm-up failed: {}", e);
    }

    let _scheduler = ExpirySweeper::new(app_state.bets.clone())
        .start(&server_config.sweep_schedule)
        .await?;

    info!("API service initialized successfully");

    // Start the web server
    let app = create_router(app_state);

    let address = server_config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("API service listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
