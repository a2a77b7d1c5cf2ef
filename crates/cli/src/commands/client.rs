//! Thin-client command handlers.
//!
//! Each command runs one [`Session`] action against `--server` and prints
//! the rendered response followed by any notices it raised.

use clap::Args;
use helpdesk_client::{HelpdeskClient, Notice, Session};
use helpdesk_core::{config::AppConfig, AppResult};

pub(crate) fn connect(config: &AppConfig) -> AppResult<Session> {
    tracing::debug!("Using server {}", config.server_url);
    Ok(Session::new(HelpdeskClient::new(config.server_url.as_str())?))
}

pub(crate) fn format_notice(notice: &Notice) -> String {
    let tag = if notice.ok { "ok" } else { "error" };
    format!("[{}] {}", tag, notice.message)
}

async fn print_notices(session: &Session) {
    for notice in session.take_notices().await {
        eprintln!("{}", format_notice(&notice));
    }
}

/// List indexed files on the server
#[derive(Args, Debug)]
pub struct FilesCommand {}

impl FilesCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let session = connect(config)?;
        let view = session.refresh_files().await?;
        println!("{}", view.text);
        println!("{} files", view.count());
        Ok(())
    }
}

/// Ask the server a question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Number of contexts to retrieve
    #[arg(short = 'k', long, default_value = "3")]
    pub top_k: u32,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let session = connect(config)?;
        println!("{}", session.ask(&self.question, self.top_k).await?);
        Ok(())
    }
}

/// Tell the server which file answers a question
#[derive(Args, Debug)]
pub struct FeedbackCommand {
    /// File that answers the question
    pub answer_file: String,

    /// The question being rated
    #[arg(short, long, default_value = "")]
    pub question: String,

    /// Depth to search for the answer file
    #[arg(short = 'k', long, default_value = "5")]
    pub top_k: u32,
}

impl FeedbackCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let session = connect(config)?;
        let rendered = session
            .submit_feedback(&self.question, &self.answer_file, self.top_k)
            .await?;
        println!("{}", rendered);
        print_notices(&session).await;
        Ok(())
    }
}

/// Show retrieval metrics from logged feedback
#[derive(Args, Debug)]
pub struct MetricsCommand {
    /// Cut-off for hit@k and nDCG@k
    #[arg(short = 'k', long, default_value = "5")]
    pub top_k: u32,
}

impl MetricsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let session = connect(config)?;
        println!("{}", session.metrics(self.top_k).await?);
        Ok(())
    }
}

/// Rebuild the server index and list files again
#[derive(Args, Debug)]
pub struct ReindexCommand {}

impl ReindexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let session = connect(config)?;
        let view = session.reindex().await?;
        print_notices(&session).await;
        println!("{}", view.text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_notice() {
        assert_eq!(format_notice(&Notice::success("Index rebuilt")), "[ok] Index rebuilt");
        assert_eq!(format_notice(&Notice::error("Feedback error")), "[error] Feedback error");
    }

    #[test]
    fn test_connect_uses_server_url() {
        let config = AppConfig {
            server_url: "http://helpdesk.internal:9000/".to_string(),
            ..AppConfig::default()
        };
        let session = connect(&config).unwrap();
        assert_eq!(session.client().base_url(), "http://helpdesk.internal:9000");
    }
}
