use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
};

/// Where the platform indexes live. Entries left unset fall back to the
/// standard locations under the data directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub media_index: Option<PathBuf>,
    pub contacts_index: Option<PathBuf>,
}

impl Settings {
    /// Media index path, honoring the configured override.
    pub fn media_index_path(&self, data_dir: &Path) -> PathBuf {
        self.media_index
            .clone()
            .unwrap_or_else(|| data_dir.join("indexes").join("media.db"))
    }

    /// Contacts index path, honoring the configured override.
    pub fn contacts_index_path(&self, data_dir: &Path) -> PathBuf {
        self.contacts_index
            .clone()
            .unwrap_or_else(|| data_dir.join("indexes").join("contacts.db"))
    }
}

/// Default data directory: the platform data dir, or a local dot directory
/// when the platform does not define one.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("devscan"))
        .unwrap_or_else(|| PathBuf::from(".devscan"))
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<Settings>,
}

impl SettingsStore {
    /// Load settings from `path`, falling back to defaults when the file is
    /// missing or unparseable. A corrupt file is not fatal; it gets
    /// rewritten on the next update.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            Settings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn settings(&self) -> Settings {
        self.data.read().unwrap().clone()
    }

    pub fn update(&self, settings: Settings) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        *guard = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &Settings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
