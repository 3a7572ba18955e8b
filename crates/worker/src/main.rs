//! Chirp trending worker entry point.
//!
//! Long-lived process that owns the trending engine's periodic maintenance:
//! hourly/daily window-counter resets and the staleness sweep.

use std::sync::Arc;

use chirp_common::Config;
use chirp_core::TrendingService;
use chirp_db::repositories::TrendRepository;
use chirp_scheduler::{MaintenanceConfig, MaintenanceExecutor, run_maintenance};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Maintenance executor backed by the trending service.
struct TrendMaintenance {
    trending: TrendingService,
}

#[async_trait::async_trait]
impl MaintenanceExecutor for TrendMaintenance {
    async fn reset_hourly(&self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.trending.reset_hourly().await?)
    }

    async fn reset_daily(&self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.trending.reset_daily().await?)
    }

    async fn deactivate_stale(
        &self,
        cutoff_days: i64,
    ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.trending.deactivate_stale(cutoff_days).await?)
    }
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chirp=debug".into()),
        )
        .init();

    info!("Starting chirp trending worker...");

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    // Connect to database
    let db = chirp_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    chirp_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories and services
    let db = Arc::new(db);
    let trend_repo = TrendRepository::new(Arc::clone(&db));
    let trending_service = TrendingService::new(trend_repo);

    // Start the maintenance scheduler
    let maintenance_config = MaintenanceConfig::from_config(&config.maintenance);
    let executor = Arc::new(TrendMaintenance {
        trending: trending_service,
    });
    run_maintenance(maintenance_config, executor).await;
    info!("Maintenance scheduler started");

    shutdown_signal().await;

    info!("Worker shutdown complete");
    Ok(())
}
