//! EPASS HTTP server.
//!
//! Campus event registration, capacity-guarded sign-up and venue check-in
//! over `PostgreSQL`.

mod config;

use anyhow::Context;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use config::Config;
use epass_core::{RegistrationEnvironment, SystemClock};
use epass_postgres::PostgresStore;
use epass_runtime::{RegistrationService, metrics::MetricsServer};
use epass_web::{AppState, build_router};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "epass=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting EPASS HTTP server");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        time_zone = %config.registration.time_zone,
        max_connections = config.database.max_connections,
        "Configuration loaded"
    );

    // Setup database
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout))
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    let store = Arc::new(PostgresStore::from_pool(pool.clone()));
    if config.database.run_migrations {
        store.migrate().await.context("Failed to apply migrations")?;
    }
    info!("Database connected");

    let env = RegistrationEnvironment::new(
        Arc::new(SystemClock),
        store.clone(),
        store.clone(),
        store.clone(),
        config.registration.time_zone,
    );
    let service = RegistrationService::new(env, config.registration.service_config());

    // Metrics
    let metrics_addr = config
        .metrics_addr()
        .parse()
        .context("Invalid metrics address")?;
    let mut metrics = MetricsServer::new(metrics_addr);
    metrics.start()?;
    spawn_metrics_listener(metrics).await?;

    // Build router
    let state = AppState::new(service, store);
    let app = build_router(state).layer(cors_layer(config.cors.allowed_origin.as_deref())?);

    let addr = config.http_addr();
    info!(address = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let drain = Duration::from_secs(config.server.shutdown_timeout);
    if tokio::time::timeout(drain, pool.close()).await.is_err() {
        warn!(timeout_secs = drain.as_secs(), "Database pool did not close in time");
    }

    info!("Server stopped");
    Ok(())
}

/// Serve `GET /metrics` in Prometheus text format on the metrics address.
async fn spawn_metrics_listener(metrics: MetricsServer) -> anyhow::Result<()> {
    let addr = metrics.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind metrics listener on {addr}"))?;
    let app = Router::new()
        .route("/metrics", get(render_metrics))
        .with_state(Arc::new(metrics));

    info!(%addr, "Metrics listener started");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Metrics listener stopped");
        }
    });
    Ok(())
}

async fn render_metrics(State(metrics): State<Arc<MetricsServer>>) -> (StatusCode, String) {
    metrics.render().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "metrics recorder not installed".to_string(),
            )
        },
        |body| (StatusCode::OK, body),
    )
}

fn cors_layer(allowed_origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    match allowed_origin {
        None => Ok(CorsLayer::permissive()),
        Some(origin) => {
            let origin = origin
                .parse::<axum::http::HeaderValue>()
                .with_context(|| format!("Invalid CORS_ALLOWED_ORIGIN '{origin}'"))?;
            Ok(CorsLayer::new()
                .allow_origin(AllowOrigin::exact(origin))
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any))
        }
    }
}

/// Graceful shutdown signal handler.
///
/// Waits for:
/// - Ctrl+C (SIGINT)
/// - SIGTERM (in production environments)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
