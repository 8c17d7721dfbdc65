use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hue_gateway::{app, AppState, Backends, GatewayConfig};

#[derive(Parser, Debug)]
#[command(name = "hue-gateway", about = "Dispatch gateway for job browser and security admin APIs")]
struct Args {
    /// Address to listen on (overrides GATEWAY_BIND)
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so local runs pick up backend URLs and flags
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = GatewayConfig::from_env();
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(port) = args.port {
        config.server.bind.set_port(port);
    }

    tracing::info!(
        environment = ?config.environment,
        proxy = config.query_store.use_proxy,
        "Starting Hue gateway"
    );

    let http = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;
    let backends = Backends::from_config(&config.backends, http.clone())
        .context("invalid backend configuration")?;
    tracing::info!(?backends, "registered backends");

    let bind_addr = config.server.bind;
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Hue gateway listening on http://{}", bind_addr);

    axum::serve(listener, app(AppState::new(config, backends, http)))
        .await
        .context("server error")?;
    Ok(())
}
