use anyhow::Result;
use axum::Router;
use chat_core::dialog::DEFAULT_START;
use chat_core::DEFAULT_THRESHOLD;
use chat_server::{build_app, ServerConfig};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Chat data JSON (questions, responses, knowledge)
    #[arg(long, default_value = "./data/responses.json")]
    data: PathBuf,
    /// Knowledge file or directory overriding the data file's knowledge section
    #[arg(long)]
    knowledge: Option<PathBuf>,
    /// Prebuilt index snapshot directory
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Minimum score a fallback match must exceed
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: f64,
    /// Id of the opening question
    #[arg(long, default_value = DEFAULT_START)]
    start: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = ServerConfig {
        data: args.data,
        knowledge: args.knowledge,
        snapshot: args.snapshot,
        threshold: args.threshold,
        start: args.start,
    };
    let app: Router = build_app(&config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
