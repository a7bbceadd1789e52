use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to read station catalog '{0}'")]
    CatalogRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse station catalog '{0}'")]
    CatalogParse(PathBuf, #[source] serde_json::Error),

    #[error("Failed to read cache file '{0}'")]
    CacheRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to write cache file '{0}'")]
    CacheWrite(PathBuf, #[source] std::io::Error),

    #[error("Failed to decode cache data from '{0}'")]
    CacheDecode(PathBuf, #[source] Box<bincode::error::DecodeError>),

    #[error("Failed to encode cache data")]
    CacheEncode(#[source] Box<bincode::error::EncodeError>),

    // Covers errors joining tokio blocking tasks
    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
