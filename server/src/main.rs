use anyhow::{Context, Result};
use clap::Parser;
use kensaku_core::persist::{load_meta, IndexPaths};
use kensaku_server::build_app;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

/// Serve boolean "any term" queries over an index built by kensaku-indexer.
#[derive(Parser)]
struct Args {
    /// Index directory written by `kensaku-indexer build --output`
    #[arg(long, default_value = "./index")]
    index: PathBuf,
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    #[arg(long, default_value_t = 8000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let paths = IndexPaths::new(&args.index);
    let meta = load_meta(&paths).with_context(|| format!("no usable index at {}", paths.root.display()))?;
    tracing::info!(
        root = %paths.root.display(),
        backend = %meta.backend,
        tokenizer = ?meta.tokenizer,
        num_docs = meta.num_docs,
        created_at = %meta.created_at,
        "serving index"
    );
    let app = build_app(&paths.root)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
