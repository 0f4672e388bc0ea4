mod args;

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use args::Args;
use scaneia_api::ApiConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing based on verbosity
    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("invalid --listen address: {}", args.listen))?;

    match &args.db {
        Some(path) => info!(path = %path.display(), "using database"),
        None => info!("using default database location"),
    }

    let config = ApiConfig {
        listen_addr: addr,
        db_path: args.db,
        openai_api_key: args.openai_api_key,
        openai_base_url: args.openai_base_url,
        openai_model: args.model,
        session_ttl: Duration::from_secs(args.session_ttl_hours * 3600),
    };

    eprintln!("ScaneIA API server listening on http://{addr}");
    scaneia_api::start_server(config).await
}
