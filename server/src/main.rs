mod handlers;
mod models;
mod routes;
mod state;

use anyhow::Context;
use article_scraper::{logging, ScraperConfig};
use axum::http::{header, Method};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use routes::scrape::scrape_routes;
use state::{listen_addr, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init("info,server=debug");

    let config = ScraperConfig::from_env();
    let state = AppState::from_env(&config).context("failed to set up extractor")?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let app = scrape_routes(state).layer(cors);

    let addr = listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
