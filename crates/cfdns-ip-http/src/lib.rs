// # HTTP IP Source
//
// This crate provides the HTTP-based IP source for cfdnsupdater.
//
// ## Architecture
//
// Fetches the current public address from an external "what is my IP"
// service (e.g. ip.shee.sh, icanhazip.com, api.ipify.org) that answers a
// plain GET with the caller's address as the response body.
//
// The connection is always made over IPv4: the client binds its local
// address to 0.0.0.0, so the service sees (and reports) our IPv4 address
// even on dual-stack hosts that would prefer IPv6.
//
// The body is trimmed and returned as-is; it is not parsed as an address.

use cfdns_core::traits::IpSource;
use cfdns_core::{Error, Result};

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Default request timeout for the IP service
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// User-Agent sent to the IP service
pub const DEFAULT_USER_AGENT: &str = concat!("cfdnsupdater/", env!("CARGO_PKG_VERSION"));

/// HTTP-based IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch IP from
    url: String,

    /// HTTP client pinned to IPv4
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source with the default User-Agent and timeout
    ///
    /// # Parameters
    ///
    /// - `url`: URL to fetch IP from (e.g., "https://ip.shee.sh/")
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_options(url, DEFAULT_USER_AGENT, DEFAULT_TIMEOUT)
    }

    /// Create with a custom User-Agent and request timeout
    pub fn with_options(
        url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .local_address(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Fetch current IP from the HTTP service
    async fn fetch_ip(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::ip_source(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::http_status(status.to_string()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::ip_source(format!("Failed to read response: {}", e)))?;

        Ok(body.trim().to_string())
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn resolve(&self) -> Result<String> {
        tracing::debug!(url = %self.url, "Fetching current IP");
        self.fetch_ip().await
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn trims_surrounding_whitespace() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("  203.0.113.7\n"))
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpIpSource::new(format!("{}/", server.uri())).unwrap();
        let ip = source.resolve().await.unwrap();

        assert_eq!(ip, "203.0.113.7");
    }

    #[tokio::test]
    async fn sends_descriptive_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", DEFAULT_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string("203.0.113.7"))
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpIpSource::new(server.uri()).unwrap();
        assert_eq!(source.resolve().await.unwrap(), "203.0.113.7");
        assert!(DEFAULT_USER_AGENT.starts_with("cfdnsupdater/"));
    }

    #[tokio::test]
    async fn non_200_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let source = HttpIpSource::new(server.uri()).unwrap();
        let err = source.resolve().await.unwrap_err();

        assert!(matches!(err, Error::HttpStatus(_)));
        assert!(err.to_string().contains("503 Service Unavailable"));
    }

    #[tokio::test]
    async fn other_success_codes_are_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let source = HttpIpSource::new(server.uri()).unwrap();
        assert!(source.resolve().await.is_err());
    }

    #[tokio::test]
    async fn body_is_not_validated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not an address\n"))
            .mount(&server)
            .await;

        let source = HttpIpSource::new(server.uri()).unwrap();
        assert_eq!(source.resolve().await.unwrap(), "not an address");
    }

    #[tokio::test]
    async fn connection_failure_is_an_ip_source_error() {
        // Port 9 (discard) on loopback is almost never listening
        let source = HttpIpSource::new("http://127.0.0.1:9/").unwrap();
        let err = source.resolve().await.unwrap_err();
        assert!(matches!(err, Error::IpSource(_)));
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("203.0.113.7")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let source =
            HttpIpSource::with_options(server.uri(), DEFAULT_USER_AGENT, Duration::from_millis(100))
                .unwrap();
        let err = source.resolve().await.unwrap_err();
        assert!(matches!(err, Error::IpSource(_)));
    }
}
