pub mod probe;

pub use probe::{DeviceProbe, SystemProbe};

use std::sync::Arc;

use anyhow::Result;
use log::{debug, warn};
use tokio::sync::Mutex;

use crate::cache::CacheStore;
use crate::models::{DeviceProfile, ATTRIBUTE_KEYS};

/// Read-through provider for the device profile.
///
/// Lookup order is memo slot, then cache, then platform probe. Device
/// attributes are treated as static for the lifetime of an install, so
/// there is no expiry and no invalidation; once the memo or the cache holds
/// a full profile the probe is never consulted again.
pub struct DeviceProfileProvider {
    cache: Option<CacheStore>,
    probe: Arc<dyn DeviceProbe>,
    memo: Mutex<Option<DeviceProfile>>,
}

impl DeviceProfileProvider {
    /// A provider without a cache store still works; it just probes once
    /// per process instead of once per install.
    pub fn new(cache: Option<CacheStore>, probe: Arc<dyn DeviceProbe>) -> Self {
        Self {
            cache,
            probe,
            memo: Mutex::new(None),
        }
    }

    /// Fetch the device profile.
    ///
    /// A cache read error degrades to a miss and a cache write error is
    /// logged and swallowed, so a broken store can slow this path down but
    /// never fail it. Only a failing probe surfaces as an error.
    pub async fn device_profile(&self) -> Result<DeviceProfile> {
        {
            let memo = self.memo.lock().await;
            if let Some(profile) = memo.as_ref() {
                return Ok(profile.clone());
            }
        }

        if let Some(profile) = self.load_cached().await {
            *self.memo.lock().await = Some(profile.clone());
            return Ok(profile);
        }

        let profile = self.probe.query()?;
        self.store(&profile).await;
        *self.memo.lock().await = Some(profile.clone());
        Ok(profile)
    }

    /// A cached profile counts only when all four attribute keys are
    /// present; anything less reads as a miss and triggers a fresh probe.
    async fn load_cached(&self) -> Option<DeviceProfile> {
        let cache = self.cache.as_ref()?;
        match cache.get_all(&ATTRIBUTE_KEYS).await {
            Ok(entries) => DeviceProfile::from_entries(&entries),
            Err(err) => {
                debug!("cache read failed, treating as miss: {err:#}");
                None
            }
        }
    }

    async fn store(&self, profile: &DeviceProfile) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        let entries: Vec<(String, String)> = profile
            .entries()
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        if let Err(err) = cache.put_all(&entries).await {
            warn!("Failed to persist device profile: {err:#}");
        }
    }
}
