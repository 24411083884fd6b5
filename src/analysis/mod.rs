//! Pure aggregation over collected records.
//!
//! Nothing here touches an index or the cache; collectors hand in slices
//! and the display layer takes the results. That keeps every rule in this
//! module testable with hand-built records.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{ContactRecord, MediaRecord, DIMENSIONS_UNKNOWN};

/// Count the contacts that carry more than one phone number. Contacts with
/// exactly one number do not count, no matter how many contacts there are.
pub fn count_multi_number_contacts(contacts: &[ContactRecord]) -> usize {
    contacts
        .iter()
        .filter(|contact| contact.phone_numbers.len() > 1)
        .count()
}

/// One bucket of the resolution distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionBucket {
    pub dimensions: String,
    pub count: usize,
}

/// Frequency table of image dimension strings, ordered by count descending.
/// The relative order of buckets with equal counts is unspecified; use
/// [`count_for`](Self::count_for) when asserting on specific buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolutionDistribution {
    buckets: Vec<ResolutionBucket>,
}

impl ResolutionDistribution {
    pub fn buckets(&self) -> &[ResolutionBucket] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Count for one dimensions string, independent of bucket order.
    pub fn count_for(&self, dimensions: &str) -> Option<usize> {
        self.buckets
            .iter()
            .find(|bucket| bucket.dimensions == dimensions)
            .map(|bucket| bucket.count)
    }
}

/// Bucket the non-video records by their dimensions string and sort the
/// buckets by frequency, most common first.
///
/// Videos are excluded up front; the video itself having dimensions does
/// not matter. Records without dimensions land in the
/// [`DIMENSIONS_UNKNOWN`] bucket rather than being dropped.
pub fn image_resolution_distribution(media: &[MediaRecord]) -> ResolutionDistribution {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in media {
        if record.is_video() {
            continue;
        }
        let dimensions = record.dimensions.as_deref().unwrap_or(DIMENSIONS_UNKNOWN);
        *counts.entry(dimensions).or_insert(0) += 1;
    }

    let mut buckets: Vec<ResolutionBucket> = counts
        .into_iter()
        .map(|(dimensions, count)| ResolutionBucket {
            dimensions: dimensions.to_string(),
            count,
        })
        .collect();
    buckets.sort_by(|a, b| b.count.cmp(&a.count));

    ResolutionDistribution { buckets }
}

/// Everything the analysis view shows, in one payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub contacts_with_multiple_numbers: usize,
    pub resolution_distribution: ResolutionDistribution,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DURATION_NONE;
    use chrono::DateTime;

    fn contact(name: &str, numbers: &[&str]) -> ContactRecord {
        ContactRecord {
            name: name.to_string(),
            phone_numbers: numbers.iter().map(|number| number.to_string()).collect(),
        }
    }

    fn media(dimensions: Option<&str>, duration: &str) -> MediaRecord {
        MediaRecord {
            file_name: "item".to_string(),
            date_created: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            file_size: 1024,
            dimensions: dimensions.map(str::to_string),
            duration: duration.to_string(),
        }
    }

    fn image(dimensions: Option<&str>) -> MediaRecord {
        media(dimensions, DURATION_NONE)
    }

    #[test]
    fn no_contacts_means_zero() {
        assert_eq!(count_multi_number_contacts(&[]), 0);
    }

    #[test]
    fn only_contacts_with_two_or_more_numbers_count() {
        let contacts = vec![
            contact("Alice", &["123", "456"]),
            contact("Bob", &["789"]),
            contact("Carol", &[]),
        ];
        assert_eq!(count_multi_number_contacts(&contacts), 1);
    }

    #[test]
    fn every_multi_number_contact_counts() {
        let contacts = vec![
            contact("Alice", &["1", "2"]),
            contact("Bob", &["3", "4", "5"]),
            contact("Carol", &["6", "7"]),
        ];
        assert_eq!(count_multi_number_contacts(&contacts), 3);
    }

    #[test]
    fn distribution_counts_images_and_skips_videos() {
        let records = vec![
            image(Some("1920x1080")),
            image(Some("1920x1080")),
            image(Some("640x480")),
            media(Some("1920x1080"), "2:00"),
        ];
        let distribution = image_resolution_distribution(&records);

        assert_eq!(distribution.len(), 2);
        assert_eq!(distribution.count_for("1920x1080"), Some(2));
        assert_eq!(distribution.count_for("640x480"), Some(1));
        // Counts differ here, so the order is fully determined.
        assert_eq!(distribution.buckets()[0].dimensions, "1920x1080");
        assert_eq!(distribution.buckets()[1].dimensions, "640x480");
    }

    #[test]
    fn missing_dimensions_fall_into_the_unknown_bucket() {
        let records = vec![image(None), image(None), image(Some("640x480"))];
        let distribution = image_resolution_distribution(&records);

        assert_eq!(distribution.count_for(DIMENSIONS_UNKNOWN), Some(2));
        assert_eq!(distribution.count_for("640x480"), Some(1));
    }

    #[test]
    fn equal_counts_keep_both_buckets() {
        let records = vec![image(Some("800x600")), image(Some("1024x768"))];
        let distribution = image_resolution_distribution(&records);

        // Tie order is unspecified; assert through count_for instead.
        assert_eq!(distribution.len(), 2);
        assert_eq!(distribution.count_for("800x600"), Some(1));
        assert_eq!(distribution.count_for("1024x768"), Some(1));
    }

    #[test]
    fn no_media_yields_an_empty_distribution() {
        let distribution = image_resolution_distribution(&[]);
        assert!(distribution.is_empty());

        let only_videos = vec![media(Some("1920x1080"), "0:30")];
        assert!(image_resolution_distribution(&only_videos).is_empty());
    }
}
