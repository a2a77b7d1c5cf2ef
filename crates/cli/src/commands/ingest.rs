//! Ingest command handler.

use clap::Args;
use helpdesk_core::{config::AppConfig, AppResult};
use helpdesk_knowledge::{create_provider, ingest, IngestOptions};

/// Rebuild the index from the raw documents
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command from {:?}", config.raw_dir());

        config.validate()?;
        config.ensure_data_dirs()?;

        let provider = create_provider(&config.embedding).await?;
        let options = IngestOptions::from_config(config);
        let stats = ingest(&options, provider).await?;

        if self.json {
            let output = serde_json::json!({
                "documents": stats.documents,
                "chunks": stats.chunks,
                "bytes": stats.bytes,
                "durationSecs": stats.duration_secs,
                "index": options.index_path.display().to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Indexed {} documents ({} chunks, {} bytes) in {:.2}s",
                stats.documents, stats.chunks, stats.bytes, stats.duration_secs
            );
            println!("Index written to {}", options.index_path.display());
        }

        Ok(())
    }
}
