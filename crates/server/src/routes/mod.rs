//! Router assembly.

pub mod ask;
pub mod feedback;
pub mod index;
pub mod ui;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(ui::index_page))
        .route("/static/ui.js", get(ui::script))
        .route("/healthz", get(index::healthz))
        .route("/files", get(index::list_files))
        .route("/reindex", post(index::reindex))
        .route("/ask", get(ask::ask_get).post(ask::ask))
        .route("/feedback", post(feedback::feedback))
        .route("/metrics", get(feedback::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
