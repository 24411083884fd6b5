use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel duration for items that are not videos.
pub const DURATION_NONE: &str = "N/A";

/// Bucket label for records whose dimensions are missing from the index.
pub const DIMENSIONS_UNKNOWN: &str = "Unknown";

/// One row of the platform's unified media index (images and videos share a
/// table), normalized for display and analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub file_name: String,
    pub date_created: DateTime<Utc>,
    pub file_size: u64,
    /// `"W x H"`, or `None` when the index has no dimensions for the row.
    pub dimensions: Option<String>,
    /// Formatted duration for videos, [`DURATION_NONE`] for everything else.
    pub duration: String,
}

impl MediaRecord {
    /// Whether the row describes a video. The index only populates a
    /// duration for videos, so the sentinel is the discriminator.
    pub fn is_video(&self) -> bool {
        self.duration != DURATION_NONE
    }
}
