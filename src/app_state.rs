use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{config::Config, database::SentimentDatabase, importer};

#[derive(Clone)]
pub struct AppState {
    pub db: SentimentDatabase,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Initialize database
        let db = SentimentDatabase::connect(&config.database).await?;
        db.init().await?;

        Ok(Self::with_database(config, db))
    }

    pub fn with_database(config: Config, db: SentimentDatabase) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Import the configured data file if it exists. Failures are logged and
    /// the service starts with whatever the database already holds.
    pub async fn load_initial_data(&self) {
        let path = Path::new(&self.config.data.file_path);
        if !path.exists() {
            warn!(file = %path.display(), "Data file not found, skipping initial import");
            return;
        }

        info!(file = %path.display(), "Found data file, importing");
        if let Err(e) = importer::load_from_file(&self.db, path).await {
            warn!(file = %path.display(), error = %e, "Initial import failed");
        }
    }
}
