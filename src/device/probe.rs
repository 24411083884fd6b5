use std::fs;
use std::path::Path;

use anyhow::Result;
use log::debug;
use sysinfo::System;

use crate::models::DeviceProfile;

/// Source of fresh device attributes.
///
/// The provider consults a probe only when neither its memo nor the cache
/// can satisfy a read, so implementations must not assume they run on every
/// call. Implementations may block; callers treat a probe as the expensive
/// path.
pub trait DeviceProbe: Send + Sync {
    fn query(&self) -> Result<DeviceProfile>;
}

/// Probe that reads the running host: DMI identity files where the kernel
/// exposes them, `sysinfo` for the OS release, and the DRM mode list for
/// the panel resolution. Attributes the host does not expose come back as
/// empty strings and flow through unchanged.
pub struct SystemProbe;

impl DeviceProbe for SystemProbe {
    fn query(&self) -> Result<DeviceProfile> {
        Ok(DeviceProfile {
            device_model: read_dmi_attribute("product_name"),
            os_version: System::long_os_version().unwrap_or_default(),
            manufacturer: read_dmi_attribute("sys_vendor"),
            screen_resolution: read_screen_resolution(),
        })
    }
}

fn read_dmi_attribute(name: &str) -> String {
    let path = Path::new("/sys/devices/virtual/dmi/id").join(name);
    match fs::read_to_string(&path) {
        Ok(value) => value.trim().to_string(),
        Err(err) => {
            debug!("dmi attribute {name} unavailable: {err}");
            String::new()
        }
    }
}

/// First advertised mode of the first DRM connector that has any, formatted
/// as `"W x H"`. Empty on hosts without DRM state (headless boxes, non-Linux
/// platforms).
fn read_screen_resolution() -> String {
    let Ok(connectors) = fs::read_dir("/sys/class/drm") else {
        return String::new();
    };

    for entry in connectors.flatten() {
        let modes_path = entry.path().join("modes");
        let Ok(modes) = fs::read_to_string(&modes_path) else {
            continue;
        };
        if let Some(mode) = modes.lines().next() {
            if let Some((width, height)) = mode.split_once('x') {
                return format!("{width} x {height}");
            }
        }
    }

    String::new()
}
