//! Rate- and concurrency-limited page fetching.
//!
//! A counting permit pool ([`tokio::sync::Semaphore`]) bounds in-flight
//! requests. Every fetch, success or failure, is followed by a fixed
//! delay held under the calling permit, so the delay throttles the
//! aggregate request rate rather than per-connection latency. There is
//! no retry; a future retry policy would slot in here.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqwest::Client;
use tokio::sync::Semaphore;
use tracing::{debug, error};
use url::Url;

use docweave_shared::{DocweaveError, FetchKind, Result};

/// User-Agent string for scrape requests.
const USER_AGENT: &str = concat!("docweave/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout at the transport layer.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Successful outcome of one HTTP GET.
#[derive(Debug, Clone)]
pub struct FetchSuccess {
    /// Response status code (always 2xx here).
    pub status: u16,
    /// Response body text.
    pub body: String,
}

/// Concurrency- and rate-limited HTTP fetcher shared by both passes.
pub struct Fetcher {
    client: Client,
    permits: Arc<Semaphore>,
    delay: Duration,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl Fetcher {
    /// Build a fetcher with the given permit count and inter-request delay.
    pub fn new(max_concurrent: usize, delay_ms: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                DocweaveError::PageNetwork(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            delay: Duration::from_millis(delay_ms),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        })
    }

    /// Fetch one page. `kind` attributes the request to a pipeline pass
    /// for logging; it never changes behavior.
    ///
    /// The permit is acquired before the request and released only after
    /// the fixed delay, success or failure.
    pub async fn fetch(&self, url: &Url, kind: FetchKind) -> Result<FetchSuccess> {
        let _permit = self
            .permits
            .acquire()
            .await
            .expect("permit pool closed");

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        debug!(%url, %kind, in_flight = current, "fetching page");
        let result = self.get(url).await;

        if let Err(e) = &result {
            error!(%url, %kind, error = %e, "page fetch failed");
        }

        // Hold the permit through the delay so the pool throttles the
        // aggregate request rate.
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn get(&self, url: &Url) -> Result<FetchSuccess> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| DocweaveError::PageNetwork(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocweaveError::PageHttp {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| DocweaveError::PageNetwork(format!("{url}: body read failed: {e}")))?;

        Ok(FetchSuccess {
            status: status.as_u16(),
            body,
        })
    }

    /// The underlying HTTP client, shared with the sitemap resolver so a
    /// run uses one connection pool.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Highest number of simultaneously in-flight requests observed so
    /// far. Reported in the run summary.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url(server: &wiremock::MockServer, path: &str) -> Url {
        Url::parse(&format!("{}{path}", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn fetch_success_carries_status_and_body() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/page"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(2, 0).unwrap();
        let result = fetcher
            .fetch(&page_url(&server, "/page"), FetchKind::Title)
            .await
            .unwrap();

        assert_eq!(result.status, 200);
        assert_eq!(result.body, "<html></html>");
    }

    #[tokio::test]
    async fn fetch_404_is_http_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/missing"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(2, 0).unwrap();
        let err = fetcher
            .fetch(&page_url(&server, "/missing"), FetchKind::Content)
            .await
            .unwrap_err();

        match err {
            DocweaveError::PageHttp { status, .. } => assert_eq!(status, 404),
            other => panic!("expected PageHttp, got {other}"),
        }
    }

    #[tokio::test]
    async fn fetch_connection_refused_is_network_error() {
        // Port chosen from the ephemeral range with nothing listening.
        let url = Url::parse("http://127.0.0.1:59999/page").unwrap();
        let fetcher = Fetcher::new(1, 0).unwrap();
        let err = fetcher.fetch(&url, FetchKind::Title).await.unwrap_err();
        assert!(matches!(err, DocweaveError::PageNetwork(_)));
    }

    #[tokio::test]
    async fn in_flight_never_exceeds_permit_count() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string("ok")
                    .set_delay(Duration::from_millis(50)),
            )
            .mount(&server)
            .await;

        let fetcher = Arc::new(Fetcher::new(3, 0).unwrap());
        let mut handles = Vec::new();

        for i in 0..12 {
            let fetcher = fetcher.clone();
            let url = page_url(&server, &format!("/page-{i}"));
            handles.push(tokio::spawn(async move {
                fetcher.fetch(&url, FetchKind::Content).await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(fetcher.peak_in_flight() >= 1);
        assert!(
            fetcher.peak_in_flight() <= 3,
            "peak {} exceeded permit count",
            fetcher.peak_in_flight()
        );
    }
}
