//! Serve command handler.

use clap::Args;
use helpdesk_core::{config::AppConfig, AppResult};

/// Run the HTTP service
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to bind, e.g. 0.0.0.0:8000
    #[arg(short, long, env = "HELPDESK_BIND")]
    pub bind: Option<String>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let config = config
            .clone()
            .with_overrides(self.bind.clone(), None, None, false, false);

        tracing::info!("Executing serve command on {}", config.bind);
        helpdesk_server::serve(config).await
    }
}
