//! Bundled single-page UI.

use axum::http::header;
use axum::response::{Html, IntoResponse};

/// GET / - the helpdesk page.
pub async fn index_page() -> Html<&'static str> {
    Html(include_str!("../../static/ui.html"))
}

/// GET /static/ui.js - the page's script.
pub async fn script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        include_str!("../../static/ui.js"),
    )
}
