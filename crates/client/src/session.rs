//! The five user actions, with last-question memory and notices.

use helpdesk_core::{AppError, AppResult};
use tokio::sync::Mutex;

use crate::client::{Fetched, HelpdeskClient};
use crate::notice::{Control, ControlGuard, Notice};

/// Result of listing the indexed files.
#[derive(Debug, Clone, PartialEq)]
pub struct FilesView {
    /// Pretty JSON list, or `Error: <body>`
    pub text: String,

    /// File names for the pickers; empty on failure
    pub files: Vec<String>,
}

impl FilesView {
    pub fn count(&self) -> usize {
        self.files.len()
    }
}

#[derive(Debug, Clone)]
struct Controls {
    files: Control,
    ask: Control,
    feedback: Control,
    metrics: Control,
    reindex: Control,
}

/// A user session against one server.
///
/// Actions take `&self`; each one holds its own [`Control`] for the length of
/// its request, so a duplicate trigger fails instead of sending twice.
#[derive(Debug)]
pub struct Session {
    client: HelpdeskClient,
    controls: Controls,
    last_question: Mutex<Option<String>>,
    picker_files: Mutex<Vec<String>>,
    notices: Mutex<Vec<Notice>>,
}

impl Session {
    pub fn new(client: HelpdeskClient) -> Self {
        Self {
            client,
            controls: Controls {
                files: Control::new("files"),
                ask: Control::new("ask"),
                feedback: Control::new("feedback"),
                metrics: Control::new("metrics"),
                reindex: Control::new("reindex"),
            },
            last_question: Mutex::new(None),
            picker_files: Mutex::new(Vec::new()),
            notices: Mutex::new(Vec::new()),
        }
    }

    pub fn client(&self) -> &HelpdeskClient {
        &self.client
    }

    pub async fn last_question(&self) -> Option<String> {
        self.last_question.lock().await.clone()
    }

    /// File names from the last successful listing.
    pub async fn picker_files(&self) -> Vec<String> {
        self.picker_files.lock().await.clone()
    }

    /// List the indexed files and refill the pickers.
    pub async fn refresh_files(&self) -> AppResult<FilesView> {
        let _guard = acquire(&self.controls.files)?;
        self.list_files().await
    }

    /// Ask a question; a successful, non-empty question is remembered.
    pub async fn ask(&self, question: &str, k: u32) -> AppResult<String> {
        let _guard = acquire(&self.controls.ask)?;
        let question = question.trim();

        let fetched = self.client.ask(question, k).await?;
        if fetched.ok && !question.is_empty() {
            *self.last_question.lock().await = Some(question.to_string());
        }

        Ok(fetched.data.render())
    }

    /// Record which file answers `question`; an empty question falls back to
    /// the last one asked.
    pub async fn submit_feedback(&self, question: &str, answer_file: &str, k: u32) -> AppResult<String> {
        let _guard = acquire(&self.controls.feedback)?;

        let question = match question.trim() {
            "" => self.last_question().await.unwrap_or_default(),
            trimmed => trimmed.to_string(),
        };

        let fetched = self.client.feedback(&question, answer_file, k).await?;
        self.raise(if fetched.ok {
            Notice::success("Feedback saved")
        } else {
            Notice::error("Feedback error")
        })
        .await;

        Ok(fetched.data.render())
    }

    pub async fn metrics(&self, k: u32) -> AppResult<String> {
        let _guard = acquire(&self.controls.metrics)?;
        let fetched = self.client.metrics(k).await?;
        Ok(fetched.render_or_error())
    }

    /// Rebuild the server index, then list files again.
    pub async fn reindex(&self) -> AppResult<FilesView> {
        let _guard = acquire(&self.controls.reindex)?;

        self.raise(Notice::success("Reindexing…")).await;
        let fetched = self.client.reindex().await?;
        self.raise(if fetched.ok {
            Notice::success("Index rebuilt")
        } else {
            Notice::error("Reindex failed")
        })
        .await;

        self.list_files().await
    }

    /// Notices that have not yet expired.
    pub async fn visible_notices(&self) -> Vec<Notice> {
        let mut notices = self.notices.lock().await;
        notices.retain(|n| !n.is_expired());
        notices.clone()
    }

    /// Remove and return every pending notice.
    pub async fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().await)
    }

    async fn raise(&self, notice: Notice) {
        tracing::debug!("Notice: {}", notice.message);
        self.notices.lock().await.push(notice);
    }

    async fn list_files(&self) -> AppResult<FilesView> {
        let fetched = self.client.list_files().await?;
        if !fetched.ok {
            return Ok(FilesView {
                text: fetched.render_or_error(),
                files: Vec::new(),
            });
        }

        let files = file_names(&fetched);
        *self.picker_files.lock().await = files.clone();

        let text = serde_json::to_string_pretty(&files)?;
        Ok(FilesView { text, files })
    }
}

fn acquire(control: &Control) -> AppResult<ControlGuard> {
    control.try_acquire().ok_or_else(|| {
        AppError::InvalidRequest(format!("'{}' is already running", control.name()))
    })
}

/// `files` from a listing; absent or malformed reads as empty.
fn file_names(fetched: &Fetched) -> Vec<String> {
    fetched
        .data
        .as_json()
        .and_then(|v| v.get("files"))
        .and_then(|v| v.as_array())
        .map(|files| {
            files
                .iter()
                .filter_map(|f| f.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    async fn files() -> Json<Value> {
        Json(json!({"files": ["printer.txt", "vpn.txt"]}))
    }

    async fn ask(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if body["question"] == "" {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({"detail": "question is empty"})),
            );
        }
        (StatusCode::OK, Json(json!({"answer": "ok", "echo": body})))
    }

    async fn feedback(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if body["answer_file"] == "missing.txt" {
            return (StatusCode::NOT_FOUND, Json(json!({"detail": "nope"})));
        }
        (StatusCode::OK, Json(json!({"echo": body})))
    }

    async fn metrics(Query(params): Query<HashMap<String, String>>) -> (StatusCode, String) {
        match params.get("k").map(String::as_str) {
            Some("5") => (StatusCode::OK, r#"{"count":1,"hit@5":1.0}"#.to_string()),
            _ => (StatusCode::NOT_FOUND, "No feedback yet.".to_string()),
        }
    }

    async fn reindex() -> (StatusCode, Json<Value>) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "Reindex failed: disk full"})),
        )
    }

    async fn stub_session() -> Session {
        let app = Router::new()
            .route("/files", get(files))
            .route("/ask", post(ask))
            .route("/feedback", post(feedback))
            .route("/metrics", get(metrics))
            .route("/reindex", post(reindex));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Session::new(HelpdeskClient::new(format!("http://{}", addr)).unwrap())
    }

    #[tokio::test]
    async fn test_refresh_files_fills_pickers() {
        let session = stub_session().await;
        let view = session.refresh_files().await.unwrap();

        assert_eq!(view.count(), 2);
        assert_eq!(view.files, ["printer.txt", "vpn.txt"]);
        assert!(view.text.contains("\"printer.txt\""));
        assert_eq!(session.picker_files().await, view.files);
    }

    #[tokio::test]
    async fn test_ask_remembers_trimmed_question() {
        let session = stub_session().await;
        let rendered = session.ask("  printer jammed  ", 3).await.unwrap();

        assert!(rendered.contains("\"question\": \"printer jammed\""));
        assert_eq!(session.last_question().await.as_deref(), Some("printer jammed"));
    }

    #[tokio::test]
    async fn test_failed_ask_keeps_previous_question() {
        let session = stub_session().await;
        session.ask("vpn drops", 3).await.unwrap();

        let rendered = session.ask("   ", 3).await.unwrap();
        assert!(rendered.contains("question is empty"));
        assert_eq!(session.last_question().await.as_deref(), Some("vpn drops"));
    }

    #[tokio::test]
    async fn test_feedback_falls_back_to_last_question() {
        let session = stub_session().await;
        session.ask("vpn drops", 3).await.unwrap();

        let rendered = session.submit_feedback("", "vpn.txt", 5).await.unwrap();
        assert!(rendered.contains("\"question\": \"vpn drops\""));
        assert!(rendered.contains("\"persist\": true"));

        let notices = session.take_notices().await;
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message, "Feedback saved");
        assert!(notices[0].ok);
    }

    #[tokio::test]
    async fn test_feedback_error_notice() {
        let session = stub_session().await;
        session.submit_feedback("q", "missing.txt", 5).await.unwrap();

        let notices = session.visible_notices().await;
        assert_eq!(notices[0].message, "Feedback error");
        assert!(!notices[0].ok);
    }

    #[tokio::test]
    async fn test_metrics_renders_json_or_error_text() {
        let session = stub_session().await;
        let ok = session.metrics(5).await.unwrap();
        assert!(ok.contains("\"hit@5\": 1.0"));

        let missing = session.metrics(3).await.unwrap();
        assert_eq!(missing, "Error: No feedback yet.");
    }

    #[tokio::test]
    async fn test_reindex_failure_still_relists() {
        let session = stub_session().await;
        let view = session.reindex().await.unwrap();
        assert_eq!(view.count(), 2);

        let messages: Vec<_> = session
            .take_notices()
            .await
            .into_iter()
            .map(|n| (n.message, n.ok))
            .collect();
        assert_eq!(
            messages,
            [
                ("Reindexing…".to_string(), true),
                ("Reindex failed".to_string(), false)
            ]
        );
    }

    #[tokio::test]
    async fn test_busy_control_rejects_duplicate() {
        let session = stub_session().await;
        let _held = session.controls.ask.try_acquire().unwrap();

        let result = session.ask("printer", 3).await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[test]
    fn test_file_names_missing_field() {
        let fetched = Fetched {
            ok: true,
            status: 200,
            data: crate::client::Payload::Json(json!({"other": 1})),
        };
        assert!(file_names(&fetched).is_empty());
    }
}
