//! Command-line and environment configuration
//!
//! Every setting can be given as a flag; the ones operators usually keep in
//! a secret store can also come from the environment. A flag wins over its
//! environment variable.

use cfdns_core::config::{self, DEFAULT_IP_SERVICE, DEFAULT_SLEEP_INTERVAL_SECS};
use cfdns_core::{Error, UpdaterConfig};
use clap::Parser;
use std::time::Duration;
use tracing::warn;

/// Default HTTP listen address (all interfaces, port 9876)
pub const DEFAULT_LISTEN: &str = ":9876";

/// Environment fallback for `--sleep-interval`
pub const SLEEP_INTERVAL_ENV: &str = "CFDNSUPDATER_SLEEP_INTERVAL";

#[derive(Parser, Debug)]
#[command(
    name = "cfdnsupdater",
    about = "Keep a Cloudflare A record pointed at this host's public IPv4 address",
    disable_version_flag = true
)]
pub struct Args {
    /// Name of the zone to update
    #[arg(long, env = "CFDNSUPDATER_ZONE")]
    pub zone: Option<String>,

    /// FQDN of the host to update
    #[arg(long, env = "CFDNSUPDATER_HOST")]
    pub host: Option<String>,

    /// Cloudflare account email address
    #[arg(long, env = "CLOUDFLARE_EMAIL")]
    pub email: Option<String>,

    /// Cloudflare account API key
    #[arg(long, env = "CLOUDFLARE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// URL of a service which returns our current IP
    #[arg(long, env = "CFDNSUPDATER_IP_SERVICE", default_value = DEFAULT_IP_SERVICE)]
    pub ip_service: String,

    /// Seconds to sleep between runs [env: CFDNSUPDATER_SLEEP_INTERVAL] [default: 300]
    #[arg(long)]
    pub sleep_interval: Option<u64>,

    /// HTTP listen address; ":port" listens on all interfaces
    #[arg(long, default_value = DEFAULT_LISTEN)]
    pub listen: String,

    /// Prefix for URL paths
    #[arg(long = "urlprefix", default_value = "")]
    pub url_prefix: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Disable JSON logging
    #[arg(long)]
    pub no_json: bool,

    /// Show version and exit
    #[arg(long)]
    pub version: bool,
}

/// Validated daemon settings
#[derive(Debug, Clone)]
pub struct DaemonSettings {
    /// Reconciliation settings
    pub updater: UpdaterConfig,
    /// Address to bind the HTTP front to
    pub listen: String,
    /// Prefix for HTTP routes
    pub url_prefix: String,
}

impl Args {
    /// Validate the arguments and turn them into daemon settings
    ///
    /// Must run after logging is set up: an unusable sleep interval in the
    /// environment is reported as a warning.
    pub fn settings(&self) -> Result<DaemonSettings, Error> {
        let sleep_interval = sleep_interval_secs(
            self.sleep_interval,
            std::env::var(SLEEP_INTERVAL_ENV).ok().as_deref(),
        );

        config::validate_url_prefix(&self.url_prefix)?;

        let updater = UpdaterConfig::new(
            self.zone.clone().unwrap_or_default(),
            self.host.clone().unwrap_or_default(),
            self.email.clone().unwrap_or_default(),
            self.api_key.clone().unwrap_or_default(),
        )
        .with_ip_service(self.ip_service.clone())
        .with_sleep_interval(Duration::from_secs(sleep_interval));
        updater.validate()?;

        Ok(DaemonSettings {
            updater,
            listen: listen_addr(&self.listen)?,
            url_prefix: self.url_prefix.clone(),
        })
    }
}

/// Pick the sleep interval in seconds
///
/// The flag wins. An environment value that is not an unsigned integer is
/// ignored with a warning and the default is used instead.
pub fn sleep_interval_secs(flag: Option<u64>, env: Option<&str>) -> u64 {
    if let Some(secs) = flag {
        return secs;
    }

    match env.filter(|raw| !raw.is_empty()) {
        None => DEFAULT_SLEEP_INTERVAL_SECS,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(
                "Environment setting '{}' for sleep interval is not a positive integer, using default {}",
                raw, DEFAULT_SLEEP_INTERVAL_SECS
            );
            DEFAULT_SLEEP_INTERVAL_SECS
        }),
    }
}

/// Normalize a listen address for binding
///
/// Accepts `host:port`, `[v6]:port`, and the `:port` shorthand for all IPv4
/// interfaces.
pub fn listen_addr(listen: &str) -> Result<String, Error> {
    let addr = if listen.starts_with(':') {
        format!("0.0.0.0{listen}")
    } else {
        listen.to_string()
    };

    let valid = match addr.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    };
    if !valid {
        return Err(Error::config(format!(
            "Listen address must look like host:port or :port (got {listen})"
        )));
    }

    Ok(addr)
}
