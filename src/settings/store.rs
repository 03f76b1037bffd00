//! Settings load/save backends

use super::Settings;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors that can occur while loading or saving settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Settings I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings file {path} is not valid: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Load/save capability injected into the display window
pub trait SettingsStore: Send {
    /// Read the stored settings; a missing store yields defaults
    fn load(&self) -> Result<Settings, SettingsError>;

    /// Persist settings
    fn save(&mut self, settings: &Settings) -> Result<(), SettingsError>;
}

/// Settings kept as pretty-printed JSON in a file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store backed by `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location: `<config_dir>/photon-elf/settings.json`
    pub fn at_default_path() -> Self {
        Self::new(Self::default_path())
    }

    /// Default settings file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("photon-elf")
            .join("settings.json")
    }

    /// Path this store reads and writes
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where an unreadable settings file is moved before it is overwritten
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".bak");
        PathBuf::from(name)
    }

    /// Move the current file aside if it exists but does not parse
    fn backup_if_unreadable(&self) -> Result<(), SettingsError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(_) => return Ok(()),
        };
        if serde_json::from_str::<Settings>(&contents).is_ok() {
            return Ok(());
        }

        let backup = self.backup_path();
        std::fs::rename(&self.path, &backup).map_err(|source| SettingsError::Io {
            path: backup.clone(),
            source,
        })?;
        tracing::warn!(
            path = %self.path.display(),
            backup = %backup.display(),
            "Settings file was unreadable, kept a backup before saving"
        );
        Ok(())
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Result<Settings, SettingsError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No settings file found, using defaults");
                return Ok(Settings::default());
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let settings = serde_json::from_str(&contents).map_err(|source| SettingsError::Parse {
            path: self.path.clone(),
            source,
        })?;
        tracing::info!(path = %self.path.display(), "Loaded settings from disk");
        Ok(settings)
    }

    fn save(&mut self, settings: &Settings) -> Result<(), SettingsError> {
        let io_err = |source: std::io::Error| SettingsError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        self.backup_if_unreadable()?;
        let json = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, json).map_err(io_err)?;
        tracing::info!(path = %self.path.display(), "Settings saved to disk");
        Ok(())
    }
}

/// Settings held in memory, shared between clones
///
/// Lets a caller keep a handle and inspect what the window saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Settings>>,
}

impl MemoryStore {
    /// Store preloaded with `settings`
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(Mutex::new(settings)),
        }
    }

    /// Current stored value
    pub fn snapshot(&self) -> Settings {
        match self.inner.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<Settings, SettingsError> {
        Ok(self.snapshot())
    }

    fn save(&mut self, settings: &Settings) -> Result<(), SettingsError> {
        match self.inner.lock() {
            Ok(mut guard) => *guard = settings.clone(),
            Err(poisoned) => *poisoned.into_inner() = settings.clone(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nope.json"));
        assert_eq!(store.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut store = JsonFileStore::new(&path);

        let settings = Settings {
            browser_searches: vec!["a".to_string(), "b?".to_string()],
            ..Default::default()
        };
        store.save(&settings).unwrap();
        assert!(path.exists());

        let loaded = JsonFileStore::new(&path).load().unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_corrupt_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = JsonFileStore::new(&path).load();
        assert!(matches!(result, Err(SettingsError::Parse { .. })));
    }

    #[test]
    fn test_save_over_corrupt_file_keeps_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let corrupt = r#"{"realtime.browser_searches": ["x"], "dpc230.window": 7,"#;
        std::fs::write(&path, corrupt).unwrap();

        let mut store = JsonFileStore::new(&path);
        assert!(store.load().is_err());
        store.save(&Settings::default()).unwrap();

        assert_eq!(store.backup_path(), dir.path().join("settings.json.bak"));
        assert_eq!(std::fs::read_to_string(store.backup_path()).unwrap(), corrupt);
        assert_eq!(store.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_save_over_valid_file_makes_no_backup() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("settings.json"));
        store.save(&Settings::default()).unwrap();
        store.save(&Settings::default()).unwrap();
        assert!(!store.backup_path().exists());
    }

    #[test]
    fn test_default_path_ends_with_app_dir() {
        let path = JsonFileStore::default_path();
        assert!(path.ends_with("photon-elf/settings.json"));
    }

    #[test]
    fn test_memory_store_shares_state() {
        let store = MemoryStore::default();
        let mut handle = store.clone();
        handle
            .save(&Settings {
                browser_searches: vec!["ab".to_string()],
                ..Default::default()
            })
            .unwrap();
        assert_eq!(store.snapshot().browser_searches, vec!["ab".to_string()]);
    }
}
