use std::sync::Arc;

use common::storage::BlobStore;
use sea_orm::DatabaseConnection;

use crate::catalog::{SeaOrmSlideCatalog, SlideCatalog};
use crate::config::AppConfig;
use crate::gate::SubmissionGate;
use crate::ingest::Ingestor;
use crate::validation::UploadPolicy;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub blobs: Arc<dyn BlobStore>,
    pub catalog: Arc<dyn SlideCatalog>,
    pub gate: Arc<SubmissionGate>,
    pub ingest: Arc<Ingestor>,
}

impl AppState {
    pub fn new(config: AppConfig, db: DatabaseConnection, blobs: Arc<dyn BlobStore>) -> Self {
        let catalog: Arc<dyn SlideCatalog> = Arc::new(SeaOrmSlideCatalog::new(db));
        let gate = Arc::new(SubmissionGate::new(
            config.submissions.flag_path.clone(),
            config.submissions.cache_ttl(),
        ));
        let ingest = Arc::new(Ingestor::new(
            blobs.clone(),
            catalog.clone(),
            gate.clone(),
            UploadPolicy::new(config.upload.max_bytes),
            config.storage.write_timeout(),
        ));

        Self {
            config: Arc::new(config),
            blobs,
            catalog,
            gate,
            ingest,
        }
    }
}
