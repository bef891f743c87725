//! HTTP storage service for recorded charts.
//!
//! Exposes [`rhy_store::StorageService`] over axum. See [`router`] for the
//! route table.

pub mod config;
mod error;
mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use rhy_store::{Database, FsObjectStore, StorageService};
use tracing::info;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::{AppState, router};

/// Open storage as configured.
pub fn open_service(config: &ServerConfig) -> Result<StorageService> {
    let db = Database::open(&config.database_path)?;
    let objects = Arc::new(FsObjectStore::open(&config.object_store_dir)?);
    Ok(StorageService::new(db, objects).with_max_upload_bytes(config.max_upload_bytes))
}

/// Bind and serve until the process exits.
pub async fn serve(config: &ServerConfig) -> Result<()> {
    let service = open_service(config)?;
    let app = router(Arc::new(service));

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    info!(address = %listener.local_addr()?, "rhy-server listening");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
