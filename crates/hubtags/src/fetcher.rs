use async_stream::try_stream;
use futures::StreamExt;
use tracing::{debug, trace};

use crate::aggregate::TagAggregator;
use crate::dto::{repository::RepositoryRef, tag::RegistryTag};
use crate::error::FetchError;
use crate::normalize::normalize_page;
use crate::source::TagSource;
use crate::tag_stream::TagStream;

/// Lazily fetch every page of tags of `target`, normalizing each page as it arrives.
///
/// Pages are requested one at a time starting at page `1`, and only when the returned stream
/// is polled. The stream ends after the page that has no `next`, or after yielding the first
/// error. Nothing is retried; call this again to start over.
pub fn fetch_tags_incrementally<S>(source: S, target: RepositoryRef) -> TagStream
where
    S: TagSource + 'static,
{
    TagStream::new(try_stream! {
        let mut page = 1u32;
        loop {
            let raw = source.fetch_page(&target, page).await?;
            let has_next = raw.has_next();
            let tags = normalize_page(&raw);
            debug!("Fetched page {} of {} with {} tags", page, target, tags.len());

            yield tags;

            if !has_next {
                trace!("Page {} was the last page of {}", page, target);
                break;
            }
            page += 1;
        }
    })
}

/// Fetch and merge every page of tags of `target`.
pub async fn fetch_all_tags<S>(source: S, target: RepositoryRef) -> Result<Vec<RegistryTag>, FetchError>
where
    S: TagSource + 'static,
{
    let mut aggregator = TagAggregator::new();
    let mut stream = fetch_tags_incrementally(source, target);

    while let Some(page) = stream.next().await {
        aggregator.merge(page?);
    }

    Ok(aggregator.into_tags())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use reqwest::StatusCode;

    use super::*;
    use crate::dto::{tag::TagId, TagEntry, TagImage, TagsPage};

    /// Serves pre-scripted pages and records which pages were requested.
    #[derive(Default)]
    pub(crate) struct ScriptedSource {
        pages: Mutex<VecDeque<Result<TagsPage, StatusCode>>>,
        pub(crate) requested: Mutex<Vec<(String, u32)>>,
    }

    impl ScriptedSource {
        pub(crate) fn new(pages: Vec<Result<TagsPage, StatusCode>>) -> Arc<Self> {
            Arc::new(Self {
                pages: Mutex::new(pages.into()),
                requested: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn requested_pages(&self) -> Vec<u32> {
            self.requested.lock().unwrap().iter().map(|(_, p)| *p).collect()
        }
    }

    #[async_trait]
    impl TagSource for ScriptedSource {
        async fn fetch_page(&self, target: &RepositoryRef, page: u32) -> Result<TagsPage, FetchError> {
            self.requested.lock().unwrap().push((target.to_string(), page));
            match self.pages.lock().unwrap().pop_front() {
                Some(Ok(p)) => Ok(p),
                Some(Err(status)) => Err(FetchError::Status { target: target.clone(), page, status }),
                None => panic!("page {} of {} was requested but never scripted", page, target),
            }
        }
    }

    pub(crate) fn entry(id: u64, name: &str, archs: &[&str]) -> TagEntry {
        TagEntry {
            id: TagId::Number(id),
            name: name.to_string(),
            images: archs.iter()
                .map(|a| TagImage { architecture: Some(a.to_string()), ..Default::default() })
                .collect(),
        }
    }

    pub(crate) fn page(entries: Vec<TagEntry>, last: bool) -> TagsPage {
        TagsPage {
            next: if last { None } else { Some("https://hub.docker.com/next".to_string()) },
            results: entries,
        }
    }

    fn names(tags: &[RegistryTag]) -> Vec<&str> {
        tags.iter().map(|t| t.name()).collect()
    }

    #[tokio::test]
    async fn stops_after_page_without_next() {
        let source = ScriptedSource::new(vec![
            Ok(page(vec![entry(1, "latest", &["amd64"])], false)),
            Ok(page(vec![entry(2, "3.19", &["amd64"])], false)),
            Ok(page(vec![entry(3, "3.18", &["arm64"])], true)),
        ]);
        let mut stream = fetch_tags_incrementally(source.clone(), "alpine".parse().unwrap());

        let mut pages = Vec::new();
        while let Some(p) = stream.next().await {
            pages.push(p.unwrap());
        }

        assert_eq!(pages.len(), 3);
        assert_eq!(names(&pages[2]), vec!["3.18"]);
        assert_eq!(source.requested_pages(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn error_ends_the_stream() {
        let source = ScriptedSource::new(vec![
            Ok(page(vec![entry(1, "latest", &["amd64"])], false)),
            Err(StatusCode::INTERNAL_SERVER_ERROR),
            Ok(page(vec![entry(3, "never", &["amd64"])], true)),
        ]);
        let mut stream = fetch_tags_incrementally(source.clone(), "alpine".parse().unwrap());

        assert_eq!(names(&stream.next().await.unwrap().unwrap()), vec!["latest"]);
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(err.is_network());
        assert_eq!(err.page(), 2);
        assert!(stream.next().await.is_none());
        assert_eq!(source.requested_pages(), vec![1, 2]);
    }

    #[tokio::test]
    async fn nothing_is_requested_until_polled() {
        let source = ScriptedSource::new(vec![
            Ok(page(vec![entry(1, "latest", &["amd64"])], false)),
            Ok(page(vec![entry(2, "edge", &["amd64"])], true)),
        ]);

        let mut stream = fetch_tags_incrementally(source.clone(), "alpine".parse().unwrap());
        assert!(source.requested_pages().is_empty());

        stream.next().await.unwrap().unwrap();
        assert_eq!(source.requested_pages(), vec![1]);

        drop(stream);
        assert_eq!(source.requested_pages(), vec![1]);
    }

    #[tokio::test]
    async fn restarts_from_first_page() {
        let source = ScriptedSource::new(vec![
            Ok(page(vec![entry(1, "latest", &["amd64"])], false)),
            Ok(page(vec![entry(1, "latest", &["amd64"])], true)),
        ]);
        let target: RepositoryRef = "bitnami/redis".parse().unwrap();

        let mut first = fetch_tags_incrementally(source.clone(), target.clone());
        first.next().await.unwrap().unwrap();
        drop(first);

        let mut second = fetch_tags_incrementally(source.clone(), target);
        second.next().await.unwrap().unwrap();
        assert!(second.next().await.is_none());

        assert_eq!(source.requested_pages(), vec![1, 1]);
        assert!(source.requested.lock().unwrap().iter().all(|(t, _)| t == "bitnami/redis"));
    }

    #[tokio::test]
    async fn fetch_all_merges_pages() {
        let source = ScriptedSource::new(vec![
            Ok(page(vec![entry(1, "latest", &["amd64"]), entry(2, "3.19", &["amd64"])], false)),
            Ok(page(vec![entry(2, "3.19-moved", &["arm64"]), entry(3, "3.18", &["amd64"])], true)),
        ]);

        let tags = fetch_all_tags(source, "alpine".parse().unwrap()).await.unwrap();
        assert_eq!(names(&tags), vec!["latest", "3.19", "3.18"]);
    }
}
