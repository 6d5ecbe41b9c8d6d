use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::dto::{tag::RegistryTag, TagEntry, TagImage, TagsPage};

/// Label used when none of a tag's images carry a valid push time.
pub const UNKNOWN_TIME_LABEL: &str = "an unknown time ago";

/// Architecture value registries use for attestation manifests and the like.
const UNKNOWN_ARCHITECTURE: &str = "unknown";

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;

/// Normalize every entry of a page, formatting times relative to the current time.
pub fn normalize_page(page: &TagsPage) -> Vec<RegistryTag> {
    normalize_page_at(page, Utc::now())
}

/// Normalize every entry of a page, formatting times relative to `now`.
pub fn normalize_page_at(page: &TagsPage, now: DateTime<Utc>) -> Vec<RegistryTag> {
    page.results.iter().map(|entry| normalize_entry(entry, now)).collect()
}

pub fn normalize_entry(entry: &TagEntry, now: DateTime<Utc>) -> RegistryTag {
    let architectures = architecture_labels(&entry.images);
    let last_updated = latest_push(&entry.images);
    let label = match last_updated {
        Some(pushed) => relative_time(pushed, now),
        None => UNKNOWN_TIME_LABEL.to_string(),
    };

    RegistryTag::new(entry.id.clone(), entry.name.clone(), architectures, last_updated, label)
}

/// Build the sorted, deduplicated `architecture[/variant]` labels of a tag's images.
pub fn architecture_labels(images: &[TagImage]) -> Vec<String> {
    let labels: BTreeSet<String> = images
        .iter()
        .filter_map(|image| {
            let arch = image.architecture.as_deref()?;
            match image.variant.as_deref() {
                Some(variant) if !variant.is_empty() => Some(format!("{}/{}", arch, variant)),
                _ => Some(arch.to_string()),
            }
        })
        .filter(|label| !label.is_empty() && label != UNKNOWN_ARCHITECTURE)
        .collect();

    labels.into_iter().collect()
}

/// The most recent valid `last_pushed` across the images.
///
/// Missing or unparsable timestamps are skipped.
pub fn latest_push(images: &[TagImage]) -> Option<DateTime<Utc>> {
    images
        .iter()
        .filter_map(|image| image.last_pushed.as_deref())
        .filter_map(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc))
        .max()
}

/// Format `then` relative to `now`, e.g. `3 days ago`.
///
/// Each bucket truncates, so 90 minutes is `1 hours ago`. Times in the future read as
/// `0 seconds ago`.
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = (now - then).num_seconds().max(0);

    if elapsed < SECONDS_PER_MINUTE {
        format!("{} seconds ago", elapsed)
    } else if elapsed < SECONDS_PER_HOUR {
        format!("{} minutes ago", elapsed / SECONDS_PER_MINUTE)
    } else if elapsed < SECONDS_PER_DAY {
        format!("{} hours ago", elapsed / SECONDS_PER_HOUR)
    } else {
        format!("{} days ago", elapsed / SECONDS_PER_DAY)
    }
}
