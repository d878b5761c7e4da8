use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use persistence::repositories::{
    ClientRepository, CounterRepository, EmailLogRepository, InvoiceRepository,
    RecurringTemplateRepository,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware};
use crate::routes::{email_logs, health, invoices, recurring};
use crate::services::billing::PgBillingStore;
use crate::services::{BillingEngine, EmailService, PdfService, RecurringBillingEngine};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub engine: Arc<BillingEngine>,
}

impl AppState {
    pub fn counter(&self) -> CounterRepository {
        CounterRepository::new(self.pool.clone(), self.config.billing.counter_start)
    }

    pub fn invoices(&self) -> InvoiceRepository {
        InvoiceRepository::new(self.pool.clone(), self.counter())
    }

    pub fn templates(&self) -> RecurringTemplateRepository {
        RecurringTemplateRepository::new(self.pool.clone())
    }

    pub fn clients(&self) -> ClientRepository {
        ClientRepository::new(self.pool.clone())
    }

    pub fn email_log(&self) -> EmailLogRepository {
        EmailLogRepository::new(self.pool.clone())
    }
}

/// Builds the production billing engine from configuration and a pool.
pub fn build_engine(config: &Config, pool: PgPool) -> BillingEngine {
    let counter = CounterRepository::new(pool.clone(), config.billing.counter_start);
    let store = PgBillingStore::new(
        InvoiceRepository::new(pool.clone(), counter),
        RecurringTemplateRepository::new(pool.clone()),
        ClientRepository::new(pool.clone()),
        EmailLogRepository::new(pool),
    );
    RecurringBillingEngine::new(
        store,
        EmailService::new(config.email.clone()),
        PdfService::new(config.pdf.clone()),
        config.company.clone(),
    )
}

pub fn create_app(config: Arc<Config>, pool: PgPool, engine: Arc<BillingEngine>) -> Router {
    let state = AppState {
        pool,
        config: config.clone(),
        engine,
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let api_routes = Router::new()
        // Invoice routes
        .route("/api/v1/invoices", post(invoices::create_invoice))
        .route("/api/v1/invoices", get(invoices::list_invoices))
        .route("/api/v1/invoices/next-number", get(invoices::next_number))
        .route("/api/v1/invoices/:id", get(invoices::get_invoice))
        .route("/api/v1/invoices/:id", put(invoices::update_invoice))
        .route("/api/v1/invoices/:id", delete(invoices::delete_invoice))
        .route("/api/v1/invoices/:id/send", post(invoices::send_invoice))
        // Recurring template routes
        .route("/api/v1/recurring", post(recurring::create_template))
        .route("/api/v1/recurring", get(recurring::list_templates))
        .route("/api/v1/recurring/run", post(recurring::run_generation))
        .route("/api/v1/recurring/:id", get(recurring::get_template))
        .route("/api/v1/recurring/:id", put(recurring::update_template))
        .route("/api/v1/recurring/:id", delete(recurring::delete_template))
        .route("/api/v1/recurring/:id/toggle", post(recurring::toggle_template))
        // Email delivery log
        .route("/api/v1/email-log", get(email_logs::list_email_log));

    Router::new()
        .merge(api_routes)
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}
