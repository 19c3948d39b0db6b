//! Crew Ops API server
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin crew-ops-api
//!
//! # Run with environment variables
//! API_PORT=8080 DATABASE_URL=postgres://... cargo run --bin crew-ops-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_JWT_EXPIRATION_SECS` - JWT token expiration in seconds (default: 3600)
//! * `API_DATABASE_URL` or `DATABASE_URL` - PostgreSQL connection string
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `API_MAX_CONNECTIONS` - Database pool size (default: 10)
//! * `API_MIN_CONNECTIONS` - Idle connections kept open (default: 1)
//! * `API_DB_ACQUIRE_TIMEOUT_SECS` - Wait for a pooled connection (default: 10)
//! * `API_DEFAULT_CURRENCY` - Currency for requests that omit one (default: MYR)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_expenses::ClaimApprovalService;
use domain_payroll::PayrollReconciler;
use infra_db::{
    create_pool, run_migrations, PostgresApproverDirectory, PostgresClaimsAdapter,
    PostgresPayrollStore,
};
use interface_api::{config::ApiConfig, create_router, AppState};

/// Loads configuration, connects and migrates the database, then serves
/// until Ctrl+C or SIGTERM.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid API configuration")?;
    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        default_currency = %config.default_currency.code(),
        "Starting Crew Ops API server"
    );

    let pool = create_pool(config.database())
        .await
        .context("failed to connect to database")?;
    run_migrations(&pool).await.context("failed to apply migrations")?;

    let claims = Arc::new(PostgresClaimsAdapter::new(pool.clone()));
    let service = ClaimApprovalService::new(
        claims.clone(),
        Arc::new(PostgresApproverDirectory::new(pool.clone())),
        claims,
    );
    let reconciler = PayrollReconciler::new(Arc::new(PostgresPayrollStore::new(pool)));

    let app = create_router(AppState::new(service, reconciler, config.clone()));

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid server address {}", config.server_addr()))?;
    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber; `RUST_LOG` overrides `log_level`
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
