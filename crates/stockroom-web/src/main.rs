//! `stockroom-web` binary entrypoint.
//!
//! Loads configuration from environment variables and starts the HTTP server.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

use std::sync::Arc;

use anyhow::{Context, Result};

use stockroom_core::observability::{LogFormat, init_logging};
use stockroom_core::storage::{MemoryBackend, ObjectStoreBackend, StorageBackend};
use stockroom_inventory::Uploads;
use stockroom_web::config::{Config, UploadMode};
use stockroom_web::server::Server;

fn document_backend(config: &Config) -> Result<Arc<dyn StorageBackend>> {
    if let Some(dir) = config.data_dir.as_deref() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create data directory {}", dir.display()))?;
        tracing::info!(data_dir = %dir.display(), "Using filesystem document store");
        return Ok(Arc::new(ObjectStoreBackend::local(dir)?));
    }
    if !config.debug {
        anyhow::bail!("STOCKROOM_DATA_DIR is required when STOCKROOM_DEBUG=false");
    }
    tracing::warn!("STOCKROOM_DATA_DIR not set; using in-memory document store (debug only)");
    Ok(Arc::new(MemoryBackend::new()))
}

fn uploads(config: &Config) -> Result<Uploads> {
    match config.upload_mode {
        UploadMode::Local => {
            std::fs::create_dir_all(&config.upload_dir).with_context(|| {
                format!("create upload directory {}", config.upload_dir.display())
            })?;
            Ok(Uploads::local(config.upload_dir.clone()))
        }
        UploadMode::Remote => {
            let bucket = &config.bucket;
            let (Some(name), Some(region), Some(public_url)) = (
                bucket.name.as_deref(),
                bucket.region.as_deref(),
                bucket.public_url.as_deref(),
            ) else {
                anyhow::bail!(
                    "STOCKROOM_BUCKET_NAME, STOCKROOM_BUCKET_REGION and STOCKROOM_BUCKET_URL are required in remote upload mode"
                );
            };
            let backend = ObjectStoreBackend::s3(name, region)?;
            Ok(Uploads::bucket(Arc::new(backend), public_url))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    config.validate()?;

    init_logging(LogFormat::for_debug(config.debug));

    let documents = document_backend(&config)?;
    let uploads = uploads(&config)?;
    tracing::info!(uploads = %uploads.describe(), "Configured image uploads");

    let server = Server::with_backends(config, documents, uploads);
    server.serve().await?;
    Ok(())
}
