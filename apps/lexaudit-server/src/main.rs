//! lexaudit server
//!
//! Analyzes uploaded legal documents (txt, pdf, docx) for grammar errors,
//! invalid statute citations and contradictory clauses. Provides REST API
//! endpoints for:
//!
//! - Document analysis
//! - Text correction with suggested fixes applied
//! - Detector listing
//!
//! ## Architecture
//!
//! Handlers are thin wrappers around `defect-engine`, which runs the
//! detectors concurrently under per-detector and global deadlines and fuses
//! their findings into one ordered error list.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use defect_engine::{DefectEngine, EngineConfig};
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;

use api::{handle_analyze, handle_correct, handle_health, handle_list_detectors};

/// Command-line arguments for the lexaudit server
#[derive(Parser, Debug)]
#[command(name = "lexaudit-server")]
#[command(about = "Legal document defect analysis server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Engine configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Per-detector timeout in milliseconds (overrides the config file)
    #[arg(long)]
    detector_timeout_ms: Option<u64>,

    /// Whole-analysis timeout in milliseconds (overrides the config file)
    #[arg(long)]
    global_timeout_ms: Option<u64>,

    /// Rate limit: requests per second per IP
    #[arg(long, default_value = "10")]
    rate_limit: u32,

    /// Maximum decoded upload size in bytes
    #[arg(long, default_value = "10485760")]
    max_upload_bytes: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DefectEngine>,
    /// Maximum decoded upload size in bytes
    pub max_upload_bytes: usize,
}

/// Routes, body limit, CORS and request tracing. Rate limiting is added in
/// `main` because it needs the peer address.
pub fn build_router(state: AppState) -> Router {
    // base64 inflates uploads by a third; leave room for the JSON envelope
    let body_limit = state.max_upload_bytes / 3 * 4 + 64 * 1024;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handle_health))
        // API endpoints
        .route("/api/detectors", get(handle_list_detectors))
        .route("/api/analyze", post(handle_analyze))
        .route("/api/correct", post(handle_correct))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn load_config(args: &Args) -> anyhow::Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(ms) = args.detector_timeout_ms {
        config.detector_timeout_ms = ms;
    }
    if let Some(ms) = args.global_timeout_ms {
        config.global_timeout_ms = ms;
    }
    config.validate()?;
    Ok(config)
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

    info!("Starting lexaudit server on {}:{}", args.host, args.port);

    let config = load_config(&args)?;
    let engine = DefectEngine::new(&config)?;
    info!(
        "Detectors: {:?}",
        engine.detectors().iter().map(|d| d.id.as_str()).collect::<Vec<_>>()
    );

    // Create rate limiter configuration
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(args.rate_limit.into())
            .burst_size(args.rate_limit.saturating_mul(2))
            .finish()
            .context("Invalid rate limit; it must be greater than zero")?,
    );

    let state = AppState {
        engine: Arc::new(engine),
        max_upload_bytes: args.max_upload_bytes,
    };

    let app = build_router(state).layer(GovernorLayer {
        config: governor_conf,
    });

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Rate limit: {} requests/second per IP", args.rate_limit);
    info!(
        "Timeouts: {}ms per detector, {}ms per analysis",
        config.detector_timeout_ms, config.global_timeout_ms
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
