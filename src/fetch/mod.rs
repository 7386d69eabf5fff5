#[cfg(feature = "browser")]
pub mod browser;

use std::time::Duration;

use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoff};

use crate::crawl::CrawlError;

const USER_AGENT: &str = "paper-crawl/0.1";

/// A page-retrieval strategy. Implementations return the document markup;
/// the caller parses it, so extraction is strategy-agnostic.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, CrawlError>;
}

/// Raw static fetch: the markup exactly as the server delivers it. Fast,
/// but the abstract may be truncated and the author list collapsed.
pub struct StaticFetcher {
    client: reqwest::Client,
    retry_max_elapsed: Duration,
}

impl StaticFetcher {
    pub fn new(timeout: Duration, retry_max_elapsed: Duration) -> Result<Self, CrawlError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            retry_max_elapsed,
        })
    }

    fn retry_policy(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: Duration::from_millis(250),
            max_interval: Duration::from_secs(5),
            max_elapsed_time: Some(self.retry_max_elapsed),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Fetch for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<String, CrawlError> {
        let operation = || async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(CrawlError::Http(e)))?;

            let status = response.status();
            if status.is_success() {
                response
                    .text()
                    .await
                    .map_err(|e| backoff::Error::transient(CrawlError::Http(e)))
            } else {
                let err = CrawlError::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                };
                if status.is_server_error() {
                    tracing::debug!(%url, %status, "transient fetch failure, will retry");
                    Err(backoff::Error::transient(err))
                } else {
                    Err(backoff::Error::permanent(err))
                }
            }
        };

        retry(self.retry_policy(), operation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(retry_window: Duration) -> StaticFetcher {
        StaticFetcher::new(Duration::from_secs(5), retry_window).unwrap()
    }

    #[tokio::test]
    async fn returns_body_on_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/paper/T/1")
            .with_status(200)
            .with_body("<html>ok</html>")
            .create_async()
            .await;

        let body = fetcher(Duration::from_secs(1))
            .fetch(&format!("{}/paper/T/1", server.url()))
            .await
            .unwrap();
        assert_eq!(body, "<html>ok</html>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/paper/T/2")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let err = fetcher(Duration::from_secs(5))
            .fetch(&format!("{}/paper/T/2", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::Status { status: 404, .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_the_window_closes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/paper/T/3")
            .with_status(503)
            .expect_at_least(2)
            .create_async()
            .await;

        let err = fetcher(Duration::from_millis(700))
            .fetch(&format!("{}/paper/T/3", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::Status { status: 503, .. }));
        mock.assert_async().await;
    }
}
