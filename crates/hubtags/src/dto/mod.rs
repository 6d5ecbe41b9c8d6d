use serde::{Deserialize, Serialize};

use self::tag::TagId;

pub mod repository;
pub mod tag;

/// One page of the `/v2/repositories/{namespace}/{repository}/tags` listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagsPage {
    /// Url of the next page, `null` or missing on the last one.
    #[serde(default)]
    pub next: Option<String>,
    pub results: Vec<TagEntry>,
}

impl TagsPage {
    /// Returns `true` if the registry reported another page after this one.
    ///
    /// An empty `next` is treated the same as a missing one.
    pub fn has_next(&self) -> bool {
        self.next.as_deref().map_or(false, |n| !n.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagEntry {
    pub id: TagId,
    pub name: String,
    #[serde(default)]
    pub images: Vec<TagImage>,
}

/// A single platform image that a tag points to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagImage {
    #[serde(default)]
    pub architecture: Option<String>,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub last_pushed: Option<String>,
}
