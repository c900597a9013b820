//! relayctl server
//!
//! Receives WhatsApp commands from Twilio, runs them against the Hetzner
//! Cloud API and replies over WhatsApp.

use axum::Router;
use clap::Parser;
use tracing::{info, instrument};

mod config;
mod routes;
mod state;

use config::Config;
use state::AppState;

/// relayctl webhook server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to (defaults to 0.0.0.0:$PORT, PORT defaulting to 8080)
    #[arg(short, long)]
    addr: Option<String>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
#[instrument]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server=debug,relayctl_core=debug".into()),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Parse CLI args
    let args = Args::parse();
    let addr = args.addr.unwrap_or_else(|| {
        let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
        format!("0.0.0.0:{}", port)
    });

    // Load configuration; missing credentials abort startup
    let config = Config::load(args.config.as_deref())?;
    info!(
        addr = %addr,
        allowed_numbers = config.allowed_phone_numbers.len(),
        "Starting relayctl server"
    );

    let state = AppState::new(config)?;

    // Build Axum router
    let app = Router::new()
        .nest("/api", routes::api_routes(state))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                }),
        );

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
