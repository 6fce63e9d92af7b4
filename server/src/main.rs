use anyhow::Result;
use axum::Router;
use clap::Parser;
use lsir_server::build_app;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Artifact store directory
    #[arg(long, env = "LSIR_STORE", default_value = "./store")]
    store: PathBuf,
    /// Ranking hash or unique prefix; the newest ranking when omitted
    #[arg(long)]
    ranking: Option<String>,
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
    let app: Router = build_app(args.store.clone(), args.ranking.clone())?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, store = %args.store.display(), "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
