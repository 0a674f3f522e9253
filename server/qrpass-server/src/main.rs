use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use qrpass_server::{create_app, QrPassServer};

/// QRPass Engine HTTP Server
#[derive(Parser, Debug)]
#[command(name = "qrpass-server")]
#[command(about = "Session security layer for the QRPass attendance platform")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(args.verbose)?;

    info!("Starting QRPass Engine HTTP Server");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let server = QrPassServer::from_env().context("Failed to initialize server state")?;
    if server.config.production {
        info!("Production mode: Secure cookie flag enabled");
    }

    let app = create_app(server);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("Invalid bind address")?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind listener")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let default_filter = if verbose {
        "qrpass_server=debug,tower_http=debug,info"
    } else {
        "qrpass_server=info,warn"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to initialize tracing")?;

    Ok(())
}
