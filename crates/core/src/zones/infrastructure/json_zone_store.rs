use std::fs;
use std::path::{Path, PathBuf};

use crate::zones::domain::zone::ZoneConfig;
use crate::zones::domain::zone_store::{ZoneStore, ZoneStoreError};

/// Stores the zone document as pretty-printed JSON at a fixed path.
pub struct JsonZoneStore {
    path: PathBuf,
}

impl JsonZoneStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ZoneStore for JsonZoneStore {
    fn load(&self) -> Result<Option<ZoneConfig>, ZoneStoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path).map_err(|source| ZoneStoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        let config: ZoneConfig = serde_json::from_str(&json)?;
        config.validate().map_err(ZoneStoreError::Invalid)?;
        Ok(Some(config))
    }

    fn save(&self, config: &ZoneConfig) -> Result<(), ZoneStoreError> {
        config.validate().map_err(ZoneStoreError::Invalid)?;
        let write_err = |source| ZoneStoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, json).map_err(write_err)?;
        log::info!(
            "Saved {} zones to {}",
            config.zones.len(),
            self.path.display()
        );
        Ok(())
    }
}
