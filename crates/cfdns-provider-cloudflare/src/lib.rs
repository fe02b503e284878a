// # Cloudflare DNS Registrar
//
// This crate provides the Cloudflare API v4 client used by cfdnsupdater.
//
// ## Behaviour
//
// - One HTTP request per trait method
// - Full error propagation (no retry, no backoff - the update loop's next
//   cycle is the only retry)
// - HTTP timeout configured (30 seconds)
// - Specific error handling for HTTP status codes (401/403, 404, 429, 5xx)
// - No caching of zone or record identifiers
//
// ## Security Requirements
//
// - API key NEVER appears in logs or Debug output
// - Provider MUST fail fast if email or key is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...&type=...`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Patch DNS Record: PATCH `/zones/:zone_id/dns_records/:record_id`
//
// Authentication uses the legacy global API key: `X-Auth-Email` and
// `X-Auth-Key` headers.

use async_trait::async_trait;
use cfdns_core::traits::{DnsRecord, DnsRegistrar};
use cfdns_core::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER: &str = "cloudflare";

/// Envelope wrapping every Cloudflare API v4 response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Record {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    content: String,
}

impl From<Record> for DnsRecord {
    fn from(record: Record) -> Self {
        DnsRecord {
            id: record.id,
            name: record.name,
            record_type: record.record_type,
            content: record.content,
        }
    }
}

/// Cloudflare DNS registrar
///
/// # Trust Level: Untrusted
///
/// This client is isolated, stateless, and single-shot. All coordination
/// (deciding what to write, when to try again) is owned by the core.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API key.
pub struct CloudflareRegistrar {
    /// Account email
    email: String,

    /// Global API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// API base URL (overridable for tests)
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for CloudflareRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareRegistrar")
            .field("email", &self.email)
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CloudflareRegistrar {
    /// Create a new Cloudflare registrar client
    ///
    /// # Parameters
    ///
    /// - `email`: Cloudflare account email
    /// - `api_key`: Cloudflare global API key
    ///
    /// # Security
    ///
    /// The API key will NEVER be logged or displayed in error messages.
    pub fn new(email: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(email, api_key, CLOUDFLARE_API_BASE)
    }

    /// Create a client talking to a different API endpoint
    pub fn with_base_url(
        email: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let email = email.into();
        let api_key = api_key.into();

        if email.is_empty() {
            return Err(Error::config("Cloudflare email cannot be empty"));
        }
        if api_key.is_empty() {
            return Err(Error::config("Cloudflare API key cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            email,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("X-Auth-Email", &self.email)
            .header("X-Auth-Key", &self.api_key)
            .header("Content-Type", "application/json")
    }

    /// Send a request and unwrap the Cloudflare response envelope
    ///
    /// `what` names the operation in error messages ("Zone lookup", ...).
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            // Map HTTP status codes to specific errors
            return Err(match status.as_u16() {
                401 | 403 => Error::auth(format!(
                    "Invalid email/API key or insufficient permissions. Status: {}",
                    status
                )),
                404 => Error::not_found(format!("{} failed: {}", what, status)),
                429 => Error::provider(
                    PROVIDER,
                    format!("Rate limit exceeded. Please retry later. Status: {}", status),
                ),
                500..=599 => Error::provider(
                    PROVIDER,
                    format!("Cloudflare server error (transient): {} - {}", status, error_text),
                ),
                _ => Error::provider(
                    PROVIDER,
                    format!("{} failed: {} - {}", what, status, error_text),
                ),
            });
        }

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("Failed to parse response: {}", e)))?;

        if !envelope.success {
            let messages = envelope
                .errors
                .iter()
                .map(|e| format!("{} ({})", e.message, e.code))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(Error::provider(
                PROVIDER,
                format!("{} rejected: {}", what, messages),
            ));
        }

        envelope.result.ok_or_else(|| {
            Error::provider(
                PROVIDER,
                format!("Invalid response format: {} returned no result", what),
            )
        })
    }
}

#[async_trait]
impl DnsRegistrar for CloudflareRegistrar {
    /// ```http
    /// GET /zones?name=example.com
    /// ```
    async fn zone_id(&self, zone_name: &str) -> Result<String> {
        tracing::debug!("Looking up zone ID for zone: {}", zone_name);

        let zones: Vec<Zone> = self
            .send(
                self.request(reqwest::Method::GET, "/zones")
                    .query(&[("name", zone_name)]),
                "Zone lookup",
            )
            .await?;

        let zone = zones
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("Zone not found: {}", zone_name)))?;

        tracing::debug!("Found zone ID: {}", zone.id);
        Ok(zone.id)
    }

    /// ```http
    /// GET /zones/:zone_id/dns_records?name=home.example.com&type=A
    /// ```
    async fn list_records(
        &self,
        zone_id: &str,
        name: &str,
        record_type: &str,
    ) -> Result<Vec<DnsRecord>> {
        tracing::debug!("Listing records: {} (type: {})", name, record_type);

        let records: Vec<Record> = self
            .send(
                self.request(reqwest::Method::GET, &format!("/zones/{}/dns_records", zone_id))
                    .query(&[("name", name), ("type", record_type)]),
                "Record lookup",
            )
            .await?;

        Ok(records.into_iter().map(DnsRecord::from).collect())
    }

    /// ```http
    /// POST /zones/:zone_id/dns_records
    /// { "type": "A", "name": "home.example.com", "content": "203.0.113.7" }
    /// ```
    async fn create_record(
        &self,
        zone_id: &str,
        name: &str,
        record_type: &str,
        content: &str,
    ) -> Result<DnsRecord> {
        let payload = serde_json::json!({
            "type": record_type,
            "name": name,
            "content": content,
        });

        let record: Record = self
            .send(
                self.request(reqwest::Method::POST, &format!("/zones/{}/dns_records", zone_id))
                    .json(&payload),
                "Record creation",
            )
            .await?;

        tracing::debug!("Created record ID: {}", record.id);
        Ok(record.into())
    }

    /// ```http
    /// PATCH /zones/:zone_id/dns_records/:record_id
    /// { "content": "203.0.113.7" }
    /// ```
    async fn update_record_content(
        &self,
        zone_id: &str,
        record_id: &str,
        content: &str,
    ) -> Result<DnsRecord> {
        let payload = serde_json::json!({ "content": content });

        let record: Record = self
            .send(
                self.request(
                    reqwest::Method::PATCH,
                    &format!("/zones/{}/dns_records/{}", zone_id, record_id),
                )
                .json(&payload),
                "Record update",
            )
            .await?;

        Ok(record.into())
    }

    fn registrar_name(&self) -> &'static str {
        PROVIDER
    }
}
