use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::scrape_handlers::{health, root, scrape_article};
use crate::state::AppState;

pub fn scrape_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/scrape", post(scrape_article))
        .with_state(state)
}
