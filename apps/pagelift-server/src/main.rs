//! Pagelift upload/parse server
//!
//! Transport-level front for the decode pipeline: accepts a single document
//! upload and answers with the first page's text geometry in screen pixels,
//! ready for an overlay editor to consume.
//!
//! ## Endpoints
//!
//! - `GET /health`: liveness probe
//! - `POST /api/parse-pdf`: raw document body in, page geometry JSON out

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pagelift_decode::LopdfDecoder;

mod api;
mod error;
#[cfg(test)]
mod tests;

use api::{handle_health, handle_parse_pdf};

/// Command-line arguments for the pagelift server
#[derive(Parser, Debug)]
#[command(name = "pagelift-server")]
#[command(about = "Pagelift upload/parse server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Render scale from document units to pixels
    #[arg(long, default_value = "1.5")]
    scale: f64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Decoder handed each uploaded document
    pub decoder: Arc<LopdfDecoder>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting pagelift server on {}:{}", args.host, args.port);

    let state = AppState {
        decoder: Arc::new(LopdfDecoder::new(args.scale)),
    };

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/api/parse-pdf", post(handle_parse_pdf))
        .layer(cors)
        .with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Render scale: {}", args.scale);

    axum::serve(listener, app).await?;

    Ok(())
}
