//! weftd — the weft daemon.
//!
//! Assembles the exchange bridge: key/value store, static asset stage,
//! handler chain, the worker task that owns it, and the HTTP edge that
//! feeds it boundary messages.
//!
//! # Usage
//!
//! ```text
//! weftd serve --port 8080 --public-dir ./public --data-dir ./data
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;
use weft_core::WeftConfig;
use weft_exchange::{HandlerChain, StaticFiles};
use weft_state::KvStore;
use weftd::{app, server::HttpBridge, worker};

#[derive(Parser)]
#[command(name = "weftd", about = "weft exchange bridge daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the exchange bridge.
    Serve {
        /// Path to weft.toml. Flags below override its values.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port to listen on.
        #[arg(long)]
        port: Option<u16>,

        /// Static files root.
        #[arg(long)]
        public_dir: Option<PathBuf>,

        /// Data directory for the key/value store.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Secret for signed session cookies.
        #[arg(long, default_value = "weft-dev-secret")]
        session_secret: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,weftd=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            port,
            public_dir,
            data_dir,
            session_secret,
        } => serve(config, port, public_dir, data_dir, session_secret).await,
    }
}

async fn serve(
    config: Option<PathBuf>,
    port: Option<u16>,
    public_dir: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    session_secret: String,
) -> anyhow::Result<()> {
    let mut config = match config {
        Some(path) => WeftConfig::from_file(&path)?,
        None => WeftConfig::default(),
    };
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(public_dir) = public_dir {
        config.static_files.public_dir = public_dir;
    }
    if let Some(data_dir) = data_dir {
        config.kv.data_dir = data_dir;
    }

    // Key/value store exposed to application code.
    std::fs::create_dir_all(&config.kv.data_dir)?;
    let store = KvStore::open(&config.kv.data_dir.join("weft.redb"))?;
    info!(dir = ?config.kv.data_dir, "kv store opened");

    // Handler chain: static assets first, application second. Built
    // once, owned by the worker for the process lifetime.
    let static_files = StaticFiles::new(&config.static_files);
    let chain = HandlerChain::new(app::kv_app(store.namespace("default"), session_secret))
        .with_static_files(static_files);

    let worker_tx = worker::spawn(chain, 64);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let bridge = HttpBridge::bind(addr, worker_tx).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            let _ = shutdown_tx.send(true);
        }
    });

    bridge.serve(shutdown_rx).await
}
