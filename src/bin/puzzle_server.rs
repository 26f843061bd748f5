use std::net::SocketAddr;

use anyhow::Context;
use puzzle_session::{config::ServerConfig, server::serve_puzzles, Catalog};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::from_env();

    let catalog = match &config.catalog_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading puzzle catalog {path}"))?;
            Catalog::from_json(&json).with_context(|| format!("loading puzzle catalog {path}"))?
        }
        None => Catalog::builtin().context("loading built-in puzzles")?,
    };
    tracing::info!(puzzles = catalog.len(), "catalog ready");

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = serve_puzzles(catalog, config.session.clone())
        .await?
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid HOST/PORT")?;
    tracing::info!("Starting server on {addr}");

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .context("server error")?;
    Ok(())
}
