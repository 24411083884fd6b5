use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Canonical attribute names in display order. These double as the cache
/// keys, so renaming one orphans previously cached values.
pub const ATTRIBUTE_KEYS: [&str; 4] = [
    "Device Model",
    "OS Version",
    "Manufacturer",
    "Screen Resolution",
];

/// Fixed-shape record of the four device attributes. Values are kept
/// verbatim as the platform reported them, including empty strings for
/// attributes the host does not expose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceProfile {
    pub device_model: String,
    pub os_version: String,
    pub manufacturer: String,
    pub screen_resolution: String,
}

impl DeviceProfile {
    /// View the profile as `(attribute name, value)` pairs in display order.
    pub fn entries(&self) -> [(&'static str, &str); 4] {
        [
            (ATTRIBUTE_KEYS[0], self.device_model.as_str()),
            (ATTRIBUTE_KEYS[1], self.os_version.as_str()),
            (ATTRIBUTE_KEYS[2], self.manufacturer.as_str()),
            (ATTRIBUTE_KEYS[3], self.screen_resolution.as_str()),
        ]
    }

    /// Reassemble a profile from cached entries. Returns `None` unless every
    /// one of the four attribute keys is present, so a partially written
    /// cache reads as a miss rather than a half-filled profile.
    pub fn from_entries(entries: &HashMap<String, String>) -> Option<Self> {
        Some(Self {
            device_model: entries.get(ATTRIBUTE_KEYS[0])?.clone(),
            os_version: entries.get(ATTRIBUTE_KEYS[1])?.clone(),
            manufacturer: entries.get(ATTRIBUTE_KEYS[2])?.clone(),
            screen_resolution: entries.get(ATTRIBUTE_KEYS[3])?.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> DeviceProfile {
        DeviceProfile {
            device_model: "XPS 13 9310".to_string(),
            os_version: "Linux 6.8".to_string(),
            manufacturer: "Dell Inc.".to_string(),
            screen_resolution: "1920 x 1080".to_string(),
        }
    }

    #[test]
    fn entries_follow_attribute_key_order() {
        let profile = profile();
        let entries = profile.entries();
        let keys: Vec<&str> = entries.iter().map(|(key, _)| *key).collect();
        assert_eq!(keys, ATTRIBUTE_KEYS);
        assert_eq!(entries[0].1, "XPS 13 9310");
        assert_eq!(entries[3].1, "1920 x 1080");
    }

    #[test]
    fn from_entries_requires_every_key() {
        let full: HashMap<String, String> = profile()
            .entries()
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        assert_eq!(DeviceProfile::from_entries(&full), Some(profile()));

        let mut partial = full.clone();
        partial.remove("OS Version");
        assert_eq!(DeviceProfile::from_entries(&partial), None);

        assert_eq!(DeviceProfile::from_entries(&HashMap::new()), None);
    }

    #[test]
    fn empty_values_round_trip() {
        let sparse = DeviceProfile {
            device_model: String::new(),
            os_version: "Linux 6.8".to_string(),
            manufacturer: String::new(),
            screen_resolution: String::new(),
        };
        let entries: HashMap<String, String> = sparse
            .entries()
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        assert_eq!(DeviceProfile::from_entries(&entries), Some(sparse));
    }
}
