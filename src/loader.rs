//! Page loaders.
//!
//! A [`Loader`] turns a URL into document text. The engine selects the static
//! or dynamic loader per job according to its [`crate::selector::PageKind`];
//! a browser-backed dynamic loader is injected by the embedding application,
//! this crate only ships the plain HTTP one.

use crate::error::CrawlError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::trace;
use url::Url;

/// Fetches the rendered content of a page.
///
/// Implementations may suspend for a full network or browser round trip and
/// should apply their own timeout.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self, url: &Url) -> Result<String, CrawlError>;
}

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_USER_AGENT: &str = concat!("scuttle/", env!("CARGO_PKG_VERSION"));

/// Static loader for plain HTML pages, backed by `reqwest`.
pub struct HttpLoader {
    client: reqwest::Client,
}

impl HttpLoader {
    pub fn new() -> Result<Self, CrawlError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, CrawlError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| {
                CrawlError::Configuration(format!("failed to build http client: {e}"))
            })?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Loader for HttpLoader {
    async fn load(&self, url: &Url) -> Result<String, CrawlError> {
        trace!(%url, "fetching page");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| CrawlError::fetch(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::fetch(
                url.as_str(),
                format!("unexpected status {status}"),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| CrawlError::fetch(url.as_str(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn loads_document_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>hi</html>"))
            .mount(&server)
            .await;

        let loader = HttpLoader::new().unwrap();
        let url = Url::parse(&format!("{}/page", server.uri())).unwrap();
        let doc = loader.load(&url).await.unwrap();
        assert_eq!(doc, "<html>hi</html>");
    }

    #[tokio::test]
    async fn non_success_status_is_a_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let loader = HttpLoader::new().unwrap();
        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        let err = loader.load(&url).await.unwrap_err();
        assert!(matches!(err, CrawlError::Fetch { .. }));
    }
}
