//! Snapshot codec - flat JSON files holding the whole content of each store
//!
//! Reads never fail: a missing or malformed file is logged and replaced by the
//! default shape. Writes go to a temporary file first and are renamed into place,
//! so a reader never sees a half-written snapshot.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use guildrole_core::entities::{ConfigSnapshot, RegistrySnapshot};
use guildrole_core::error::DomainError;
use guildrole_core::value_objects::Snowflake;

/// Reads and writes the registry and configuration snapshot files
#[derive(Debug, Clone)]
pub struct SnapshotCodec {
    registry_path: PathBuf,
    config_path: PathBuf,
}

impl SnapshotCodec {
    pub fn new(registry_path: impl Into<PathBuf>, config_path: impl Into<PathBuf>) -> Self {
        Self {
            registry_path: registry_path.into(),
            config_path: config_path.into(),
        }
    }

    pub fn registry_path(&self) -> &Path {
        &self.registry_path
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Create the data directory and both files with their default contents if absent
    pub fn ensure_files(&self) {
        Self::ensure_file(&self.registry_path, &RegistrySnapshot::default());
        Self::ensure_file(&self.config_path, &ConfigSnapshot::new());
    }

    /// Load the registry snapshot, falling back to the empty shape
    ///
    /// Each role is decoded on its own; an entry that cannot be decoded is
    /// skipped so the rest of the registry still loads.
    pub fn load_registry(&self) -> RegistrySnapshot {
        let Some(mut sections) = Self::read::<Map<String, Value>>(&self.registry_path) else {
            return RegistrySnapshot::default();
        };

        RegistrySnapshot {
            roles: self.decode_section(&mut sections, "roles"),
            deleted: self.decode_section(&mut sections, "deleted"),
        }
    }

    /// Load the configuration snapshot, falling back to the empty shape
    ///
    /// Entries whose key is not a valid guild id are skipped; record bodies are
    /// kept raw and normalized later, on first read.
    pub fn load_configs(&self) -> ConfigSnapshot {
        let Some(records) = Self::read::<Map<String, Value>>(&self.config_path) else {
            return ConfigSnapshot::new();
        };
        self.decode_entries(&self.config_path, records)
    }

    pub fn write_registry(&self, snapshot: &RegistrySnapshot) -> Result<(), DomainError> {
        Self::write_atomic(&self.registry_path, snapshot)
    }

    pub fn write_configs(&self, snapshot: &ConfigSnapshot) -> Result<(), DomainError> {
        Self::write_atomic(&self.config_path, snapshot)
    }

    fn ensure_file<T: Serialize>(path: &Path, default: &T) {
        if path.exists() {
            return;
        }
        match Self::write_atomic(path, default) {
            Ok(()) => debug!(path = %path.display(), "Created snapshot file"),
            Err(e) => error!(path = %path.display(), error = %e, "Failed to create snapshot file"),
        }
    }

    fn decode_section<T: DeserializeOwned>(
        &self,
        sections: &mut Map<String, Value>,
        section: &str,
    ) -> BTreeMap<Snowflake, T> {
        match sections.remove(section) {
            Some(Value::Object(entries)) => self.decode_entries(&self.registry_path, entries),
            None | Some(Value::Null) => BTreeMap::new(),
            Some(_) => {
                warn!(
                    path = %self.registry_path.display(),
                    section,
                    "Snapshot section is not an object, using empty section"
                );
                BTreeMap::new()
            }
        }
    }

    fn decode_entries<T: DeserializeOwned>(
        &self,
        path: &Path,
        entries: Map<String, Value>,
    ) -> BTreeMap<Snowflake, T> {
        entries
            .into_iter()
            .filter_map(|(key, entry)| {
                let Ok(id) = Snowflake::parse(&key) else {
                    warn!(path = %path.display(), key = %key, "Skipping snapshot entry with invalid id");
                    return None;
                };
                match serde_json::from_value(entry) {
                    Ok(decoded) => Some((id, decoded)),
                    Err(e) => {
                        warn!(path = %path.display(), key = %key, error = %e, "Skipping undecodable snapshot entry");
                        None
                    }
                }
            })
            .collect()
    }

    fn read<T: DeserializeOwned>(path: &Path) -> Option<T> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Snapshot unreadable, using empty state");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Snapshot malformed, using empty state");
                None
            }
        }
    }

    fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), DomainError> {
        let snapshot_error = |action: &str, e: std::io::Error| {
            DomainError::SnapshotError(format!("{action} {}: {e}", path.display()))
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| snapshot_error("create directory for", e))?;
        }

        let json = serde_json::to_vec_pretty(value)?;
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, json).map_err(|e| snapshot_error("write", e))?;
        fs::rename(&tmp_path, path).map_err(|e| snapshot_error("rename into", e))
    }
}
