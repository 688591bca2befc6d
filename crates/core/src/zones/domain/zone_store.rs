use std::path::PathBuf;

use thiserror::Error;

use super::zone::ZoneConfig;

#[derive(Error, Debug)]
pub enum ZoneStoreError {
    #[error("failed to read zone file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write zone file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed zone document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid zone configuration: {0}")]
    Invalid(String),
}

/// Persistence port for the zone document.
///
/// `load` returns `Ok(None)` when nothing has been configured yet, which
/// callers treat as a warning rather than a failure.
pub trait ZoneStore: Send + Sync {
    fn load(&self) -> Result<Option<ZoneConfig>, ZoneStoreError>;

    /// Replaces the persisted document. Implementations validate first.
    fn save(&self, config: &ZoneConfig) -> Result<(), ZoneStoreError>;
}
