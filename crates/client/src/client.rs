//! HTTP transport.

use helpdesk_core::{AppError, AppResult};
use reqwest::Method;
use serde_json::{json, Value};

/// Response body: parsed JSON when possible, otherwise the raw text.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    pub fn parse(body: String) -> Self {
        match serde_json::from_str(&body) {
            Ok(value) => Payload::Json(value),
            Err(_) => Payload::Text(body),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            Payload::Text(_) => None,
        }
    }

    /// Pretty-printed JSON, or the text unchanged.
    pub fn render(&self) -> String {
        match self {
            Payload::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            Payload::Text(text) => text.clone(),
        }
    }
}

/// Outcome of a single request.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    /// Whether the status was 2xx
    pub ok: bool,
    pub status: u16,
    pub data: Payload,
}

impl Fetched {
    /// The rendered body, prefixed with `Error: ` when the request failed.
    pub fn render_or_error(&self) -> String {
        if self.ok {
            self.data.render()
        } else {
            format!("Error: {}", self.data.render())
        }
    }
}

/// Client for a running helpdesk server.
#[derive(Debug, Clone)]
pub struct HelpdeskClient {
    base_url: String,
    http: reqwest::Client,
}

impl HelpdeskClient {
    pub fn new(base_url: impl Into<String>) -> AppResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(AppError::Config("Server URL is empty".to_string()));
        }

        let http = reqwest::Client::builder().build()?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request and read the whole body as text.
    ///
    /// Any status counts as a response; only transport failures are errors.
    pub async fn fetch_json(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> AppResult<Fetched> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);

        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Http(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::Http(format!("Failed to read response from {}: {}", url, e)))?;

        tracing::debug!("{} answered {}", url, status);

        Ok(Fetched {
            ok: status.is_success(),
            status: status.as_u16(),
            data: Payload::parse(text),
        })
    }

    pub async fn healthz(&self) -> AppResult<Fetched> {
        self.fetch_json(Method::GET, "/healthz", None).await
    }

    pub async fn list_files(&self) -> AppResult<Fetched> {
        self.fetch_json(Method::GET, "/files", None).await
    }

    pub async fn ask(&self, question: &str, k: u32) -> AppResult<Fetched> {
        let body = json!({ "question": question, "k": k });
        self.fetch_json(Method::POST, "/ask", Some(&body)).await
    }

    pub async fn feedback(&self, question: &str, answer_file: &str, k: u32) -> AppResult<Fetched> {
        let body = json!({
            "question": question,
            "answer_file": answer_file,
            "k": k,
            "persist": true,
        });
        self.fetch_json(Method::POST, "/feedback", Some(&body)).await
    }

    pub async fn metrics(&self, k: u32) -> AppResult<Fetched> {
        self.fetch_json(Method::GET, &format!("/metrics?k={}", k), None)
            .await
    }

    pub async fn reindex(&self) -> AppResult<Fetched> {
        self.fetch_json(Method::POST, "/reindex", None).await
    }
}
