//! Attache server
//!
//! Serves content from a file data store over HTTP.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use attache_core::config::AppConfig;
use attache_endpoint::RoutedEndpoint;
use attache_store::{App, AppRegistry, FileDataStore};

mod health;

use health::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging
    init_tracing();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.server.host,
        port = config.server.port,
        root_path = %config.datastore.root_path.display(),
        "Starting Attache"
    );

    let registry = Arc::new(AppRegistry::new());
    let app = registry.create(app_from_config(&config));
    let state = Arc::new(AppState::new(config.clone(), registry));

    let router = build_router(state, app);

    let addr = config.server_addr();
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,attache_server=debug,attache_endpoint=debug,attache_store=debug,tower_http=debug"
                    .into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// App backed by the configured file data store
fn app_from_config(config: &AppConfig) -> App {
    let datastore = FileDataStore::from_config(&config.datastore);
    App::new(config.app.name.clone(), Arc::new(datastore))
        .with_secret(config.app.secret.clone())
        .with_verify_urls(config.app.verify_urls)
}

/// `/media` -> `/media/*uid`
fn content_route(mount_path: &str) -> String {
    format!("{}/*uid", mount_path.trim_end_matches('/'))
}

/// Build the application router
fn build_router(state: Arc<AppState>, app: Arc<App>) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .with_state(state.clone());

    let content_routes =
        RoutedEndpoint::fetching(app).router(&content_route(&state.config.server.mount_path));

    Router::new()
        .merge(health_routes)
        .merge(content_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
