//! Report page fetching and response classification.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use super::http_client::HttpClient;
use crate::models::Unavailable;

/// Classified result of a single page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 200 with the page body.
    Success(Vec<u8>),
    NotFound,
    Forbidden,
    Gone,
    /// Any other status. Always fatal for a crawl session.
    Unexpected(u16),
}

impl FetchOutcome {
    /// Map a status code (and body, for 200) to an outcome.
    pub fn classify(status: u16, body: Vec<u8>) -> Self {
        match status {
            200 => Self::Success(body),
            404 => Self::NotFound,
            403 => Self::Forbidden,
            410 => Self::Gone,
            other => Self::Unexpected(other),
        }
    }

    /// The placeholder kind for terminal non-200 outcomes.
    pub fn unavailable(&self) -> Option<Unavailable> {
        match self {
            Self::NotFound => Some(Unavailable::NotFound),
            Self::Forbidden => Some(Unavailable::Forbidden),
            Self::Gone => Some(Unavailable::Gone),
            Self::Success(_) | Self::Unexpected(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid report URL for {id}: {source}")]
    InvalidUrl {
        id: i64,
        #[source]
        source: url::ParseError,
    },

    #[error("request for report {id} failed: {source}")]
    Transport {
        id: i64,
        #[source]
        source: reqwest::Error,
    },
}

/// Source of report pages, keyed by identifier.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, id: i64) -> Result<FetchOutcome, FetchError>;
}

/// Fetches report pages over HTTP from `<base_url><id>`.
pub struct HttpPageFetcher {
    client: HttpClient,
    base_url: Url,
}

impl HttpPageFetcher {
    pub fn new(client: HttpClient, mut base_url: Url) -> Self {
        // Url::join replaces the last segment unless the base ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { client, base_url }
    }

    pub fn report_url(&self, id: i64) -> Result<Url, FetchError> {
        self.base_url
            .join(&id.to_string())
            .map_err(|source| FetchError::InvalidUrl { id, source })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, id: i64) -> Result<FetchOutcome, FetchError> {
        let url = self.report_url(id)?;
        info!("Fetching report {}", id);

        let response = self
            .client
            .get(url.as_str())
            .await
            .map_err(|source| FetchError::Transport { id, source })?;
        let status = response.status.as_u16();

        if !response.is_success() {
            return Ok(match FetchOutcome::classify(status, Vec::new()) {
                FetchOutcome::Unexpected(code) => {
                    warn!("Unexpected HTTP status {} for report {}", code, id);
                    FetchOutcome::Unexpected(code)
                }
                outcome => {
                    info!("Report {} returned HTTP {}", id, status);
                    outcome
                }
            });
        }

        debug!(
            "Report {} content type: {}",
            id,
            response.content_type().unwrap_or("unknown")
        );
        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport { id, source })?;

        Ok(FetchOutcome::classify(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn fetcher_for(server: &MockServer) -> HttpPageFetcher {
        let client = HttpClient::new(Duration::from_secs(5), None).unwrap();
        let base = Url::parse(&format!("{}/report", server.uri())).unwrap();
        HttpPageFetcher::new(client, base)
    }

    async fn mount(server: &MockServer, id: i64, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(format!("/report/{id}")))
            .respond_with(template)
            .expect(1)
            .mount(server)
            .await;
    }

    #[test]
    fn test_report_url_join() {
        let client = HttpClient::new(Duration::from_secs(5), None).unwrap();
        let with_slash = HttpPageFetcher::new(
            client.clone(),
            Url::parse("https://www.fixmystreet.com/report/").unwrap(),
        );
        let without_slash = HttpPageFetcher::new(
            client,
            Url::parse("https://www.fixmystreet.com/report").unwrap(),
        );
        assert_eq!(
            with_slash.report_url(42).unwrap().as_str(),
            "https://www.fixmystreet.com/report/42"
        );
        assert_eq!(
            without_slash.report_url(42).unwrap().as_str(),
            "https://www.fixmystreet.com/report/42"
        );
    }

    #[tokio::test]
    async fn test_success_returns_body() {
        let server = MockServer::start().await;
        mount(&server, 1, ResponseTemplate::new(200).set_body_string("<html></html>")).await;

        let outcome = fetcher_for(&server).await.fetch(1).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Success(b"<html></html>".to_vec()));
    }

    #[tokio::test]
    async fn test_terminal_statuses() {
        let server = MockServer::start().await;
        mount(&server, 2, ResponseTemplate::new(404)).await;
        mount(&server, 3, ResponseTemplate::new(403)).await;
        mount(&server, 4, ResponseTemplate::new(410)).await;

        let fetcher = fetcher_for(&server).await;
        assert_eq!(fetcher.fetch(2).await.unwrap(), FetchOutcome::NotFound);
        assert_eq!(fetcher.fetch(3).await.unwrap(), FetchOutcome::Forbidden);
        assert_eq!(fetcher.fetch(4).await.unwrap(), FetchOutcome::Gone);
    }

    #[tokio::test]
    async fn test_unexpected_status_is_not_retried() {
        let server = MockServer::start().await;
        mount(&server, 5, ResponseTemplate::new(503)).await;

        let outcome = fetcher_for(&server).await.fetch(5).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Unexpected(503));
        assert_eq!(outcome.unavailable(), None);
    }

    #[tokio::test]
    async fn test_transport_failure_is_error() {
        let client = HttpClient::new(Duration::from_secs(2), None).unwrap();
        // Nothing listens on port 9 of the loopback interface.
        let fetcher = HttpPageFetcher::new(client, Url::parse("http://127.0.0.1:9/report/").unwrap());
        let err = fetcher.fetch(1).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { id: 1, .. }));
    }

    #[test]
    fn test_unavailable_mapping() {
        assert_eq!(
            FetchOutcome::NotFound.unavailable(),
            Some(Unavailable::NotFound)
        );
        assert_eq!(FetchOutcome::Success(Vec::new()).unavailable(), None);
    }
}
