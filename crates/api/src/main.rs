use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use backoffice_api::app;
use backoffice_api::config::Config;
use backoffice_api::jobs::{
    JobScheduler, OverdueSweepJob, RecurringBillingJob, ScheduledSendJob,
};
use backoffice_api::middleware;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load()?;

    // Initialize logging and metrics
    middleware::logging::init_logging(&config.logging);
    middleware::init_metrics();

    info!("Starting Backoffice API v{}", env!("CARGO_PKG_VERSION"));

    // Create database pool
    let pool = persistence::db::create_pool(&config.db_config()).await?;

    // Run migrations
    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    let config = Arc::new(config);
    let engine = Arc::new(app::build_engine(&config, pool.clone()));

    // Background jobs: daily generation, hourly scheduled sends, daily
    // overdue sweep
    let mut scheduler = JobScheduler::new();
    scheduler.register(RecurringBillingJob::new(
        Arc::clone(&engine),
        config.billing.run_hour_utc,
    ));
    scheduler.register(ScheduledSendJob::new(
        persistence::repositories::InvoiceRepository::new(
            pool.clone(),
            persistence::repositories::CounterRepository::new(
                pool.clone(),
                config.billing.counter_start,
            ),
        ),
        Arc::clone(&engine),
    ));
    scheduler.register(OverdueSweepJob::new(
        persistence::repositories::InvoiceRepository::new(
            pool.clone(),
            persistence::repositories::CounterRepository::new(
                pool.clone(),
                config.billing.counter_start,
            ),
        ),
    ));
    scheduler.start();

    // Build application
    let router = app::create_app(Arc::clone(&config), pool, engine);

    // Start server
    let addr = config.socket_addr();
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop background jobs after the server drains
    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
