//! Runtime environment helpers
//!
//! Builds the repository bundle for the configured storage backend.

use std::path::Path;

use configs::{DatabaseConfig, StorageBackend};
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::repository::Repositories;

/// Storage picked at startup; the connection is kept for migrations and `/health`.
pub enum Storage {
    Postgres(DatabaseConnection),
    Memory,
    Json,
}

/// Open the repositories for `cfg.backend`.
pub async fn open_repositories(cfg: &DatabaseConfig) -> anyhow::Result<(Repositories, Storage)> {
    match cfg.backend {
        StorageBackend::Postgres => {
            let db = models::db::connect_with_config(cfg).await?;
            info!(backend = "postgres", "repositories ready");
            Ok((Repositories::seaorm(db.clone()), Storage::Postgres(db)))
        }
        StorageBackend::Memory => {
            info!(backend = "memory", "repositories ready; data is lost on exit");
            Ok((Repositories::memory(), Storage::Memory))
        }
        StorageBackend::Json => {
            common::env::ensure_data_dir(&cfg.data_dir).await?;
            let repos = Repositories::persistent(Path::new(&cfg.data_dir)).await?;
            info!(backend = "json", data_dir = %cfg.data_dir, "repositories ready");
            Ok((repos, Storage::Json))
        }
    }
}
