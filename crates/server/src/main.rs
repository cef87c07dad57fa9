//! StockMate API server.
//!
//! Serves the JSON API for shop accounts, warehouses and inventory.
//!
//! # Storage
//!
//! `STOCKMATE_DATABASE_URL` selects the backend: a `postgres://` URL uses
//! `PostgreSQL` (migrations are applied with `stockmate migrate`), while
//! `memory://` keeps everything in process for local runs.
//!
//! # Email
//!
//! With `SMTP_HOST` set, welcome, OTP and reset emails go out over SMTP.
//! Without it they are only logged (recipient and kind, never the payload).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockmate_server::config::ServerConfig;
use stockmate_server::db::{self, MemoryStore, Stores};
use stockmate_server::routes;
use stockmate_server::services::clock::SystemClock;
use stockmate_server::services::email::{LogNotifier, Notifier, SmtpNotifier};
use stockmate_server::state::AppState;

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ServerConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = ServerConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stockmate_server=info,tower_http=debug".into());

    // JSON output for log shippers, text otherwise
    let json_logs = std::env::var("STOCKMATE_LOG_FORMAT").is_ok_and(|v| v == "json");
    let json_layer =
        json_logs.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json_logs).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let stores = if config.uses_memory_store() {
        tracing::warn!("Using in-memory store; data is lost on restart");
        Stores::memory(Arc::new(MemoryStore::new()))
    } else {
        let pool = db::create_pool(&config.database_url)
            .await
            .expect("Failed to create database pool");
        tracing::info!("Database pool created");
        // Migrations are NOT run on startup: `stockmate migrate`
        Stores::postgres(pool)
    };

    let notifier: Arc<dyn Notifier> = match &config.email {
        Some(email) => Arc::new(SmtpNotifier::new(email).expect("Failed to configure SMTP")),
        None => {
            tracing::warn!("SMTP_HOST not set; notifications will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let state = AppState::new(config.clone(), stores, notifier, Arc::new(SystemClock))
        .expect("Failed to create application state");

    let app = routes::app(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    tracing::info!("stockmate-server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
