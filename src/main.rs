//! devicemap - Device Location Visualizer
//!
//! Shows anchors and sensors on a floor plan, either live or as trails over
//! a selected time range.

mod config;
mod controller;
mod model;
mod source;
mod style;
mod trail;
mod view;
mod web;

use config::ServerConfig;
use controller::PageController;
use source::{DeviceService, MockProvider};
use web::Server;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("devicemap=info".parse()?))
        .init();

    // Load configuration
    let cfg = ServerConfig::load();
    tracing::info!("Starting devicemap on port {}...", cfg.http_port);

    let service = DeviceService::new(cfg.api.clone(), MockProvider::default())?;
    tracing::info!("Using positioning API at {}", service.base_url());

    // Initial load, then live polling
    let controller = PageController::new(Arc::new(service), cfg.poll_interval);
    controller.start().await;

    // Start web server
    let server = Server::new(cfg, controller.clone());
    server.start().await?;

    controller.shutdown().await;
    Ok(())
}
