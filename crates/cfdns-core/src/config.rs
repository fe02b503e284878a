//! Configuration types for cfdnsupdater
//!
//! The configuration is built once at startup, validated, and never mutated.

use std::time::Duration;

/// IP discovery service used when none is configured
pub const DEFAULT_IP_SERVICE: &str = "https://ip.shee.sh/";

/// Default number of seconds between update cycles
pub const DEFAULT_SLEEP_INTERVAL_SECS: u64 = 300;

/// Settings for reconciling one A record
#[derive(Clone)]
pub struct UpdaterConfig {
    /// DNS zone name (e.g. "example.com")
    pub zone: String,

    /// Fully-qualified host name to keep up to date; must be inside `zone`
    pub host: String,

    /// Registrar account email
    pub email: String,

    /// Registrar API key
    /// ⚠️ NEVER log this value
    pub api_key: String,

    /// URL of a service that answers with our public IP as plain text
    pub ip_service: String,

    /// Pause between update cycles
    pub sleep_interval: Duration,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for UpdaterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdaterConfig")
            .field("zone", &self.zone)
            .field("host", &self.host)
            .field("email", &self.email)
            .field("api_key", &"<REDACTED>")
            .field("ip_service", &self.ip_service)
            .field("sleep_interval", &self.sleep_interval)
            .finish()
    }
}

impl UpdaterConfig {
    /// Create a configuration with the default IP service and interval
    pub fn new(
        zone: impl Into<String>,
        host: impl Into<String>,
        email: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            zone: zone.into(),
            host: host.into(),
            email: email.into(),
            api_key: api_key.into(),
            ip_service: DEFAULT_IP_SERVICE.to_string(),
            sleep_interval: Duration::from_secs(DEFAULT_SLEEP_INTERVAL_SECS),
        }
    }

    /// Set the IP discovery URL
    pub fn with_ip_service(mut self, url: impl Into<String>) -> Self {
        self.ip_service = url.into();
        self
    }

    /// Set the pause between update cycles
    pub fn with_sleep_interval(mut self, interval: Duration) -> Self {
        self.sleep_interval = interval;
        self
    }

    /// Validate the configuration
    ///
    /// Required fields are checked in the order an operator would set them,
    /// so the first error names the first missing setting.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.zone.is_empty() {
            return Err(crate::Error::config(
                "Zone name must be set, set --zone or CFDNSUPDATER_ZONE",
            ));
        }
        if self.host.is_empty() {
            return Err(crate::Error::config(
                "Host name must be set, set --host or CFDNSUPDATER_HOST",
            ));
        }
        if !host_in_zone(&self.host, &self.zone) {
            return Err(crate::Error::config(format!(
                "The host name must end with the zone name (host: {}, zone: {})",
                self.host, self.zone
            )));
        }
        if self.email.is_empty() {
            return Err(crate::Error::config(
                "Cloudflare email must be set, set --email or CLOUDFLARE_EMAIL",
            ));
        }
        if self.api_key.is_empty() {
            return Err(crate::Error::config(
                "Cloudflare API key must be set, set --api-key or CLOUDFLARE_API_KEY",
            ));
        }
        if self.ip_service.is_empty() {
            return Err(crate::Error::config("IP service URL cannot be empty"));
        }
        if !self.ip_service.starts_with("https://") && !self.ip_service.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "IP service URL must use HTTP or HTTPS scheme. Got: {}",
                self.ip_service
            )));
        }
        if self.sleep_interval.is_zero() {
            return Err(crate::Error::config("Sleep interval must be > 0"));
        }

        Ok(())
    }
}

/// Check that `host` is the zone apex or a name below it
///
/// Comparison is case-insensitive and ignores a trailing root dot.
pub fn host_in_zone(host: &str, zone: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let zone = zone.trim_end_matches('.').to_ascii_lowercase();

    if zone.is_empty() {
        return false;
    }

    host == zone || host.ends_with(&format!(".{zone}"))
}

/// Validate the optional path prefix under which HTTP routes are mounted
///
/// An empty prefix is allowed. A non-empty prefix must start with "/" or the
/// routes would never match, and must be a literal path: route parameter and
/// wildcard syntax (`:`, `*`, `{`, `}`) is rejected.
pub fn validate_url_prefix(prefix: &str) -> Result<(), crate::Error> {
    if !prefix.is_empty() && !prefix.starts_with('/') {
        return Err(crate::Error::config(format!(
            "URL prefix must start with a / or it won't match (got {prefix})"
        )));
    }
    if let Some(c) = prefix.chars().find(|c| matches!(c, ':' | '*' | '{' | '}')) {
        return Err(crate::Error::config(format!(
            "URL prefix must be a literal path, '{c}' is not allowed (got {prefix})"
        )));
    }
    Ok(())
}
