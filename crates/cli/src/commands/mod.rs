//! Command handlers for the Helpdesk CLI.
//!
//! `serve`, `ingest` and `eval` work on the local workspace; the rest are
//! thin-client commands against a running server.

pub mod client;
pub mod console;
pub mod eval;
pub mod ingest;
pub mod serve;

// Re-export command types for convenience
pub use client::{AskCommand, FeedbackCommand, FilesCommand, MetricsCommand, ReindexCommand};
pub use console::ConsoleCommand;
pub use eval::EvalCommand;
pub use ingest::IngestCommand;
pub use serve::ServeCommand;
