//! HTTP service for the helpdesk.
//!
//! Exposes the retriever, the feedback log, and index rebuilds as a small
//! JSON API, and serves the bundled single-page UI at `/`.
//!
//! | route          | method     | purpose                               |
//! |----------------|------------|---------------------------------------|
//! | `/`            | GET        | bundled UI                            |
//! | `/static/ui.js`| GET        | UI script                             |
//! | `/healthz`     | GET        | liveness + retriever readiness        |
//! | `/files`       | GET        | indexed file names                    |
//! | `/ask`         | GET, POST  | top-k retrieval with a stitched answer|
//! | `/feedback`    | POST       | record where the right file ranked    |
//! | `/metrics`     | GET        | hit@k, MRR, nDCG@k over feedback      |
//! | `/reindex`     | POST       | rebuild the index and reload          |

pub mod error;
pub mod routes;
pub mod state;

pub use routes::app;
pub use state::AppState;

use helpdesk_core::{AppConfig, AppResult};

/// Load state, bind the configured address, and serve until Ctrl-C.
pub async fn serve(config: AppConfig) -> AppResult<()> {
    let bind = config.bind.clone();
    let state = AppState::initialize(config).await?;
    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!("Helpdesk listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Helpdesk stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
