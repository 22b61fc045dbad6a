//! Web server module.

mod handlers;

pub use handlers::*;

use crate::config::ServerConfig;
use crate::controller::PageController;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use rust_embed::RustEmbed;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Static files compiled into the binary.
#[derive(RustEmbed)]
#[folder = "assets/"]
pub struct Assets;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub controller: PageController,
}

/// Web server for the visualizer page.
pub struct Server {
    state: AppState,
}

impl Server {
    pub fn new(config: ServerConfig, controller: PageController) -> Self {
        Self {
            state: AppState { config, controller },
        }
    }

    /// Build the router with all routes.
    pub(crate) fn routes(&self) -> Router {
        let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

        Router::new()
            // Page and fragments
            .route("/", get(handlers::handle_index))
            .route("/fragment/map", get(handlers::handle_map_fragment))
            .route("/fragment/devices", get(handlers::handle_devices_fragment))
            // API endpoints
            .route("/api/state", get(handlers::handle_get_state))
            .route("/api/mode", post(handlers::handle_set_mode))
            .route("/api/time-range", post(handlers::handle_set_time_range))
            .route("/api/time-range/{edge}", post(handlers::handle_edit_time_range))
            .route("/api/devices", get(handlers::handle_get_devices))
            .route("/api/devices/{id}", get(handlers::handle_get_device))
            .route("/api/devices/{id}/select", post(handlers::handle_select_device))
            .route("/api/historical-positions", get(handlers::handle_get_historical_positions))
            .route("/api/notices", get(handlers::handle_get_notices))
            // Static assets
            .route("/assets/{*path}", get(handlers::handle_asset))
            .route("/favicon.ico", get(handlers::handle_favicon))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(DefaultBodyLimit::max(64 * 1024))
            .with_state(self.state.clone())
    }

    /// Serve until Ctrl-C.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let router = self.routes();

        tracing::info!("Web server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
