//! Incremental tag browsing for Docker Hub style registries.
//!
//! Pages of tags are pulled lazily from a [`TagSource`](source::TagSource), normalized into
//! [`RegistryTag`](dto::tag::RegistryTag)s, merged into a deduplicated
//! [`TagAggregator`](aggregate::TagAggregator) and ranked against a live query by the
//! [`fuzzy filter`](filter::fuzzy_filter).

pub mod aggregate;
pub mod browser;
pub mod config;
pub mod dto;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod normalize;
pub mod source;
pub mod tag_stream;

pub use aggregate::TagAggregator;
pub use browser::{BrowserState, TagBrowser};
pub use dto::tag::{RegistryTag, TagId};
pub use dto::repository::RepositoryRef;
pub use error::FetchError;
pub use fetcher::{fetch_all_tags, fetch_tags_incrementally};
pub use filter::{fuzzy_filter, FuzzyFilter};
pub use source::{hub::HubSource, TagSource};
pub use tag_stream::TagStream;
