pub mod hub;

use async_trait::async_trait;

use crate::{dto::{repository::RepositoryRef, TagsPage}, error::FetchError};

/// Number of tags requested per page.
pub const PAGE_SIZE: u32 = 100;

/// Somewhere pages of tags can be read from.
#[async_trait]
pub trait TagSource: Send + Sync {
    /// Fetch a single page of tags.
    ///
    /// Parameters:
    /// * `target` - The repository to list the tags of.
    /// * `page` - The page to fetch, starting at `1`.
    ///
    /// Returns the raw page, whose `next` field tells if another page exists.
    async fn fetch_page(&self, target: &RepositoryRef, page: u32) -> Result<TagsPage, FetchError>;
}

#[async_trait]
impl<T: TagSource + ?Sized> TagSource for std::sync::Arc<T> {
    async fn fetch_page(&self, target: &RepositoryRef, page: u32) -> Result<TagsPage, FetchError> {
        (**self).fetch_page(target, page).await
    }
}

#[async_trait]
impl<T: TagSource + ?Sized> TagSource for Box<T> {
    async fn fetch_page(&self, target: &RepositoryRef, page: u32) -> Result<TagsPage, FetchError> {
        (**self).fetch_page(target, page).await
    }
}
