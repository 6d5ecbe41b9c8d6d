use reqwest::StatusCode;

use crate::dto::repository::RepositoryRef;

/// Errors that end a tag fetch.
///
/// Every variant terminates the page stream it came from. Nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to fetch tags for {target} (page {page}): {source}")]
    Network {
        target: RepositoryRef,
        page: u32,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to fetch tags for {target} (page {page}): registry responded with {status}")]
    Status {
        target: RepositoryRef,
        page: u32,
        status: StatusCode,
    },
    #[error("failed to fetch tags for {target} (page {page}): unexpected response body: {reason}")]
    Parse {
        target: RepositoryRef,
        page: u32,
        reason: String,
    },
}

impl FetchError {
    /// The page that failed.
    pub fn page(&self) -> u32 {
        match self {
            FetchError::Network { page, .. }
            | FetchError::Status { page, .. }
            | FetchError::Parse { page, .. } => *page,
        }
    }

    /// Returns `true` for transport and non-success status failures.
    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Network { .. } | FetchError::Status { .. })
    }
}
