use std::sync::Arc;

use anyhow::Context;
use common::storage::filesystem::FilesystemBlobStore;
use tracing::{Level, info};

use flyerbox_server::config::AppConfig;
use flyerbox_server::database;
use flyerbox_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;

    let blobs = FilesystemBlobStore::new(
        config.storage.blob_dir.clone(),
        config.storage.chunk_size,
    )
    .await
    .with_context(|| {
        format!(
            "Failed to open blob store at {}",
            config.storage.blob_dir.display()
        )
    })?
    .with_max_size(config.upload.max_bytes);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, db, Arc::new(blobs));
    info!(
        flag = %state.gate.path().display(),
        enabled = state.gate.is_enabled().await,
        "Submissions flag loaded"
    );
    let app = flyerbox_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
