pub mod analysis;
pub mod cache;
pub mod collect;
pub mod device;
pub mod models;
pub mod sample;
pub mod settings;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::warn;

use analysis::{count_multi_number_contacts, image_resolution_distribution, AnalysisSummary};
use cache::CacheStore;
use collect::{ContactCollection, ContactsIndex, MediaIndex};
use device::{DeviceProbe, DeviceProfileProvider, SystemProbe};
use models::{ContactRecord, DeviceProfile, MediaRecord};

pub use analysis::{ResolutionBucket, ResolutionDistribution};
pub use models::ATTRIBUTE_KEYS;
pub use settings::{default_data_dir, Settings, SettingsStore};

/// Resolved locations an [`Extractor`] works against. Index paths are taken
/// as given; precedence between flags, settings, and defaults is the
/// caller's business.
pub struct ExtractorConfig {
    pub data_dir: PathBuf,
    pub media_index: PathBuf,
    pub contacts_index: PathBuf,
}

/// Front door of the crate: owns the device profile provider and the index
/// handles, so callers get one value to thread around.
pub struct Extractor {
    provider: DeviceProfileProvider,
    media: MediaIndex,
    contacts_index: PathBuf,
}

impl Extractor {
    /// Wire up an extractor probing the running host.
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        Self::with_probe(config, Arc::new(SystemProbe))
    }

    /// Wire up an extractor with a custom probe. A cache store that cannot
    /// be opened degrades device reads to the probe path instead of failing
    /// construction; collection is unaffected either way.
    pub fn with_probe(config: ExtractorConfig, probe: Arc<dyn DeviceProbe>) -> Result<Self> {
        fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("failed to create data directory {}", config.data_dir.display())
        })?;

        let cache = match CacheStore::open(config.data_dir.join("cache.db")) {
            Ok(store) => Some(store),
            Err(err) => {
                warn!("Cache store unavailable, device reads will probe the platform: {err:#}");
                None
            }
        };

        Ok(Self {
            provider: DeviceProfileProvider::new(cache, probe),
            media: MediaIndex::new(config.media_index),
            contacts_index: config.contacts_index,
        })
    }

    /// Device profile, served from cache when possible.
    pub async fn device_profile(&self) -> Result<DeviceProfile> {
        self.provider.device_profile().await
    }

    /// All media records from the platform index.
    pub fn media_metadata(&self) -> Result<Vec<MediaRecord>> {
        self.media.list()
    }

    /// Start collecting contacts in the background. Must be called from
    /// within a Tokio runtime.
    pub fn collect_contacts(&self) -> ContactCollection {
        ContactCollection::start(ContactsIndex::new(self.contacts_index.clone()))
    }

    /// Collect everything the analysis view needs and aggregate it.
    pub async fn analysis_summary(&self) -> Result<AnalysisSummary> {
        let contacts: Vec<ContactRecord> = self.collect_contacts().finish().await?;
        let media = self.media_metadata()?;
        Ok(AnalysisSummary {
            contacts_with_multiple_numbers: count_multi_number_contacts(&contacts),
            resolution_distribution: image_resolution_distribution(&media),
        })
    }
}
