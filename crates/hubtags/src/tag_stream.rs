use std::{pin::Pin, task::{Context, Poll}};

use futures::{Stream, stream::FusedStream};
use pin_project_lite::pin_project;

use crate::{dto::tag::RegistryTag, error::FetchError};

type PageStream = Pin<Box<dyn Stream<Item = Result<Vec<RegistryTag>, FetchError>> + Send + 'static>>;

pin_project! {
    /// Lazy stream of normalized tag pages.
    ///
    /// A page is only requested when the stream is polled for it, so dropping the stream stops
    /// the fetch. The stream ends after the last page or after yielding the first error.
    pub struct TagStream {
        pages_yielded: usize,
        done: bool,
        #[pin]
        inner: PageStream,
    }
}

impl TagStream {
    /// Create a new `TagStream` by wrapping a `futures` stream.
    pub fn new<S>(stream: S) -> TagStream
    where
        S: Stream<Item = Result<Vec<RegistryTag>, FetchError>> + Send + 'static,
    {
        TagStream {
            pages_yielded: 0,
            done: false,
            inner: Box::pin(stream),
        }
    }

    /// Number of pages successfully yielded so far.
    pub fn pages_yielded(&self) -> usize {
        self.pages_yielded
    }
}

impl std::fmt::Debug for TagStream {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "<TagStream pages_yielded={} done={}>", self.pages_yielded, self.done)
    }
}

impl Stream for TagStream {
    type Item = Result<Vec<RegistryTag>, FetchError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if *this.done {
            return Poll::Ready(None);
        }

        match futures::ready!(this.inner.poll_next(cx)) {
            Some(Ok(page)) => {
                *this.pages_yielded += 1;
                Poll::Ready(Some(Ok(page)))
            },
            Some(Err(e)) => {
                *this.done = true;
                Poll::Ready(Some(Err(e)))
            },
            None => {
                *this.done = true;
                Poll::Ready(None)
            },
        }
    }
}

impl FusedStream for TagStream {
    fn is_terminated(&self) -> bool {
        self.done
    }
}

#[cfg(test)]
mod tests {
    use futures::{stream, StreamExt};
    use reqwest::StatusCode;

    use super::*;

    fn status_error(page: u32) -> FetchError {
        FetchError::Status {
            target: "alpine".parse().unwrap(),
            page,
            status: StatusCode::BAD_GATEWAY,
        }
    }

    #[tokio::test]
    async fn nothing_follows_an_error() {
        let items = vec![Ok(vec![]), Err(status_error(2)), Ok(vec![])];
        let mut s = TagStream::new(stream::iter(items));

        assert!(s.next().await.unwrap().is_ok());
        assert_eq!(s.pages_yielded(), 1);
        assert_eq!(s.next().await.unwrap().unwrap_err().page(), 2);
        assert!(s.is_terminated());
        assert!(s.next().await.is_none());
        assert_eq!(s.pages_yielded(), 1);
    }

    #[tokio::test]
    async fn counts_pages() {
        let mut s = TagStream::new(stream::iter(vec![Ok(vec![]), Ok(vec![]), Ok(vec![])]));
        while let Some(page) = s.next().await {
            page.unwrap();
        }
        assert_eq!(s.pages_yielded(), 3);
        assert!(s.is_terminated());
    }
}
