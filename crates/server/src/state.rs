use std::sync::Arc;

use helpdesk_core::{AppConfig, AppError, AppResult};
use helpdesk_knowledge::{FeedbackLog, Retriever};
use tokio::sync::{Mutex, RwLock};

/// Shared application state.
///
/// The retriever sits behind a lock so a reindex can swap it while
/// in-flight searches keep using the `Arc` they already hold.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub retriever: Arc<RwLock<Option<Arc<Retriever>>>>,
    pub feedback: FeedbackLog,
    pub reindex_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: AppConfig, retriever: Option<Retriever>) -> Self {
        let feedback = FeedbackLog::new(config.feedback_path());
        Self {
            config: Arc::new(config),
            retriever: Arc::new(RwLock::new(retriever.map(Arc::new))),
            feedback,
            reindex_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Create data directories and try to load the index.
    ///
    /// A missing or unusable index is not fatal: the service starts and
    /// answers 503 until a reindex succeeds.
    pub async fn initialize(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        config.ensure_data_dirs()?;

        let retriever = match helpdesk_knowledge::load_retriever(&config).await {
            Ok(retriever) => {
                tracing::info!(
                    "Retriever ready: {} chunks across {} files",
                    retriever.len(),
                    retriever.files().len()
                );
                Some(retriever)
            }
            Err(e) => {
                tracing::warn!("Retriever not loaded, starting without it: {}", e);
                None
            }
        };

        Ok(Self::new(config, retriever))
    }

    /// The current retriever, or `NotReady`.
    pub async fn retriever(&self) -> AppResult<Arc<Retriever>> {
        self.retriever.read().await.clone().ok_or(AppError::NotReady)
    }

    pub async fn is_ready(&self) -> bool {
        self.retriever.read().await.is_some()
    }

    pub async fn replace_retriever(&self, retriever: Retriever) {
        *self.retriever.write().await = Some(Arc::new(retriever));
    }
}
