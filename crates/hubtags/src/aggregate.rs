use std::collections::HashMap;

use tracing::trace;

use crate::dto::tag::{RegistryTag, TagId};

/// Accumulates pages of tags into a deduplicated set that keeps first-seen order.
///
/// A tag whose id was already merged is ignored, so re-delivering a page changes nothing.
/// One aggregator belongs to one fetch, call [`TagAggregator::reset`] when the target changes.
#[derive(Debug, Default, Clone)]
pub struct TagAggregator {
    /// Position of each merged id in `tags`.
    index: HashMap<TagId, usize>,
    tags: Vec<RegistryTag>,
}

impl TagAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every merged tag.
    pub fn reset(&mut self) {
        self.index.clear();
        self.tags.clear();
    }

    /// Merge a page, appending tags with unseen ids in page order.
    ///
    /// Returns every tag merged so far.
    pub fn merge(&mut self, page: Vec<RegistryTag>) -> &[RegistryTag] {
        let before = self.tags.len();

        for tag in page {
            if self.index.contains_key(tag.id()) {
                continue;
            }
            self.index.insert(tag.id().clone(), self.tags.len());
            self.tags.push(tag);
        }

        trace!("Merged {} new tags, {} total", self.tags.len() - before, self.tags.len());
        &self.tags
    }

    pub fn tags(&self) -> &[RegistryTag] {
        &self.tags
    }

    pub fn contains(&self, id: &TagId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &TagId) -> Option<&RegistryTag> {
        self.index.get(id).map(|&i| &self.tags[i])
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn into_tags(self) -> Vec<RegistryTag> {
        self.tags
    }
}
