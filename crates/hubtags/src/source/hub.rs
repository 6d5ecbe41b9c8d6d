use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::RegistryConfig;
use crate::dto::{repository::RepositoryRef, TagsPage};
use crate::error::FetchError;

use super::{TagSource, PAGE_SIZE};

/// Reads tags from a Docker Hub compatible `/v2/repositories` api.
#[derive(Debug, Clone)]
pub struct HubSource {
    client: Client,
    url: String,
}

impl HubSource {
    /// Create a source for the registry at `url` with a default client.
    pub fn new(url: &str) -> HubSource {
        Self::with_client(Client::new(), url)
    }

    pub fn with_client(client: Client, url: &str) -> HubSource {
        Self {
            client,
            url: url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a source from the registry section of the config.
    ///
    /// The configured timeout is applied per request, the fetcher itself never times out.
    pub fn from_config(config: &RegistryConfig) -> Result<HubSource, reqwest::Error> {
        let mut builder = Client::builder()
            .user_agent(config.user_agent.clone());

        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self::with_client(builder.build()?, &config.url))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn tags_url(&self, target: &RepositoryRef) -> String {
        format!("{}/v2/repositories/{}/{}/tags", self.url, target.namespace, target.repository)
    }
}

#[async_trait]
impl TagSource for HubSource {
    async fn fetch_page(&self, target: &RepositoryRef, page: u32) -> Result<TagsPage, FetchError> {
        let url = self.tags_url(target);
        debug!("Requesting page {} of tags from '{}'", page, url);

        let response = self.client.get(&url)
            .query(&[("page", page), ("page_size", PAGE_SIZE)])
            .send().await
            .map_err(|e| {
                warn!("Request for page {} of {} failed: {}", page, target, e);
                FetchError::Network { target: target.clone(), page, source: e }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Registry responded with {} for page {} of {}", status, page, target);
            return Err(FetchError::Status { target: target.clone(), page, status });
        }

        // A body that breaks off mid-read is a network error, not a parse error.
        let body = response.text().await
            .map_err(|e| FetchError::Network { target: target.clone(), page, source: e })?;

        serde_json::from_str::<TagsPage>(&body)
            .map_err(|e| {
                warn!("Failed to parse page {} of {}: {}", page, target, e);
                FetchError::Parse { target: target.clone(), page, reason: e.to_string() }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_url_layout() {
        let source = HubSource::new("https://hub.docker.com/");
        let target: RepositoryRef = "bitnami/redis".parse().unwrap();

        assert_eq!(source.url(), "https://hub.docker.com");
        assert_eq!(
            source.tags_url(&target),
            "https://hub.docker.com/v2/repositories/bitnami/redis/tags"
        );
    }
}
