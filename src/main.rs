use anyhow::Result;
use clap::Parser;
use medvoice::{create_router, AppState, Config, GenerationBackend, HttpGenerationBackend, InMemorySessionStore};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "medvoice", about = "AI voice consultation service")]
struct Args {
    /// Path to the configuration file (without extension)
    #[arg(short, long, default_value = "config/medvoice")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v0.1.0", cfg.service.name);
    info!(
        "Generation backend: {} (model {})",
        cfg.backend.base_url, cfg.backend.model
    );
    info!("Call-event transport: {}", cfg.transport.nats_url);

    let store = Arc::new(InMemorySessionStore::new());
    let backend = Arc::new(HttpGenerationBackend::new(&cfg.backend));

    if !backend.is_configured() {
        warn!(
            "{} is not set; calls cannot start until the credential is configured",
            cfg.backend.api_key_env
        );
    }

    let state = AppState::new(store, backend, cfg.transport.nats_url.clone());

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, create_router(state)).await?;

    Ok(())
}
