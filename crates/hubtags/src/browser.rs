use std::fmt;
use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::aggregate::TagAggregator;
use crate::dto::{repository::RepositoryRef, tag::RegistryTag};
use crate::error::FetchError;
use crate::fetcher::fetch_tags_incrementally;
use crate::filter::FuzzyFilter;
use crate::source::TagSource;
use crate::tag_stream::TagStream;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserState {
    /// No repository selected.
    Idle,
    /// Pages are still being pulled.
    Fetching,
    /// Every page was merged.
    Streamed,
    /// A page failed, the pages merged before it are kept.
    Failed(String),
}

impl fmt::Display for BrowserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowserState::Idle => write!(f, "idle"),
            BrowserState::Fetching => write!(f, "fetching"),
            BrowserState::Streamed => write!(f, "streamed"),
            BrowserState::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

/// Browses the tags of one repository at a time.
///
/// Selecting a repository starts a fresh fetch into an empty aggregate. Pages are pulled with
/// [`TagBrowser::next_page`] and the current set can be filtered at any time, including while
/// pages are still arriving.
pub struct TagBrowser {
    source: Arc<dyn TagSource>,
    target: Option<RepositoryRef>,
    stream: Option<TagStream>,
    aggregator: TagAggregator,
    filter: FuzzyFilter,
    state: BrowserState,
    pages_merged: usize,
}

impl TagBrowser {
    pub fn new(source: Arc<dyn TagSource>) -> Self {
        Self {
            source,
            target: None,
            stream: None,
            aggregator: TagAggregator::new(),
            filter: FuzzyFilter::default(),
            state: BrowserState::Idle,
            pages_merged: 0,
        }
    }

    pub fn with_filter(mut self, filter: FuzzyFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn state(&self) -> &BrowserState {
        &self.state
    }

    pub fn target(&self) -> Option<&RepositoryRef> {
        self.target.as_ref()
    }

    /// Every tag merged so far, in first-seen order.
    pub fn tags(&self) -> &[RegistryTag] {
        self.aggregator.tags()
    }

    /// Number of pages merged for the current target.
    pub fn pages_merged(&self) -> usize {
        self.pages_merged
    }

    /// Switch to `target`.
    ///
    /// Returns `false` and changes nothing if `target` is already selected. Otherwise the
    /// previous fetch is dropped, the aggregate is emptied and a new fetch starts.
    pub fn select(&mut self, target: RepositoryRef) -> bool {
        if self.target.as_ref() == Some(&target) {
            debug!("{} is already selected", target);
            return false;
        }

        self.start(target);
        true
    }

    /// Start the current target over from its first page.
    pub fn reload(&mut self) {
        if let Some(target) = self.target.clone() {
            self.start(target);
        }
    }

    /// Drop the current target and everything fetched for it.
    pub fn clear(&mut self) {
        self.stream = None;
        self.target = None;
        self.aggregator.reset();
        self.pages_merged = 0;
        self.set_state(BrowserState::Idle);
    }

    fn start(&mut self, target: RepositoryRef) {
        self.aggregator.reset();
        self.pages_merged = 0;
        self.stream = Some(fetch_tags_incrementally(self.source.clone(), target.clone()));
        info!("Browsing tags of {}", target);
        self.target = Some(target);
        self.set_state(BrowserState::Fetching);
    }

    fn set_state(&mut self, state: BrowserState) {
        if self.state != state {
            debug!("Browser state {} -> {}", self.state, state);
            self.state = state;
        }
    }

    /// Pull and merge the next page.
    ///
    /// Returns the merged tags, or `None` once there is nothing left to fetch. An error moves
    /// the browser to [`BrowserState::Failed`] and ends the fetch.
    pub async fn next_page(&mut self) -> Result<Option<&[RegistryTag]>, FetchError> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };

        match stream.next().await {
            Some(Ok(page)) => {
                self.pages_merged += 1;
                Ok(Some(self.aggregator.merge(page)))
            },
            Some(Err(e)) => {
                warn!("Fetching tags stopped: {}", e);
                self.stream = None;
                self.set_state(BrowserState::Failed(e.to_string()));
                Err(e)
            },
            None => {
                self.stream = None;
                info!("Fetched {} tags over {} pages", self.aggregator.len(), self.pages_merged);
                self.set_state(BrowserState::Streamed);
                Ok(None)
            },
        }
    }

    /// Pull pages until the fetch ends.
    pub async fn drain(&mut self) -> Result<&[RegistryTag], FetchError> {
        while self.next_page().await?.is_some() {}
        Ok(self.aggregator.tags())
    }

    /// The merged tags matching `query`, best first. A blank query returns all of them.
    pub fn filtered(&mut self, query: &str) -> Vec<&RegistryTag> {
        self.filter.filter_tags(query, self.aggregator.tags())
    }
}
