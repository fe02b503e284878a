// # cfdnsupdater
//
// Thin integration layer: parses configuration, wires the IP source, the
// Cloudflare registrar and the update engine together, and serves the
// health and metrics endpoints until SIGTERM or SIGINT.
//
// ## Configuration
//
// Flags, with environment fallbacks for the values usually kept in a
// secret store:
//
// - `--zone` / `CFDNSUPDATER_ZONE`: zone containing the record
// - `--host` / `CFDNSUPDATER_HOST`: FQDN of the A record to maintain
// - `--email` / `CLOUDFLARE_EMAIL`: Cloudflare account email
// - `--api-key` / `CLOUDFLARE_API_KEY`: Cloudflare account API key
// - `--ip-service` / `CFDNSUPDATER_IP_SERVICE`: URL returning our public IP
// - `--sleep-interval` / `CFDNSUPDATER_SLEEP_INTERVAL`: seconds between runs
// - `--listen`: HTTP listen address (default `:9876`)
// - `--urlprefix`: prefix for the HTTP routes
// - `--debug`, `--no-json`, `--version`
//
// ## Example
//
// ```bash
// export CLOUDFLARE_EMAIL=ops@example.com
// export CLOUDFLARE_API_KEY=your_key
//
// cfdnsupdater --zone example.com --host home.example.com --urlprefix /cfdns
// ```

mod cli;
mod logging;
mod server;

use anyhow::{Context, Result, anyhow};
use axum::Router;
use cfdns_core::{Reconciler, UpdateEngine, UpdateMetrics};
use cfdns_ip_http::HttpIpSource;
use cfdns_provider_cloudflare::CloudflareRegistrar;
use clap::Parser;
use cli::{Args, DaemonSettings};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{Instrument, error, info};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

pub(crate) const VERSION: &str = env!("CARGO_PKG_VERSION");

pub(crate) const COMMIT: &str = match option_env!("CFDNSUPDATER_COMMIT") {
    Some(commit) => commit,
    None => "unknown",
};

/// Time allowed for the update loop and HTTP server to wind down
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum UpdaterExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<UpdaterExitCode> for ExitCode {
    fn from(code: UpdaterExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Startup failures are reported with exit code 1, anything after with 2
enum DaemonError {
    Startup(anyhow::Error),
    Runtime(anyhow::Error),
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                UpdaterExitCode::ConfigError
            } else {
                UpdaterExitCode::CleanShutdown
            }
            .into();
        }
    };

    if args.version {
        println!("cfdnsupdater {VERSION} [{COMMIT}]");
        return UpdaterExitCode::CleanShutdown.into();
    }

    if let Err(e) = logging::init(args.debug, !args.no_json) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return UpdaterExitCode::ConfigError.into();
    }

    let root = logging::root_span();
    let _entered = root.enter();

    let settings = match args.settings() {
        Ok(settings) => settings,
        Err(e) => {
            error!("{}", e);
            return UpdaterExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return UpdaterExitCode::ConfigError.into();
        }
    };

    let result = rt.block_on(run_daemon(settings).instrument(root.clone()));

    match result {
        Ok(()) => UpdaterExitCode::CleanShutdown,
        Err(DaemonError::Startup(e)) => {
            error!("Startup error: {:#}", e);
            UpdaterExitCode::ConfigError
        }
        Err(DaemonError::Runtime(e)) => {
            error!("Daemon error: {:#}", e);
            UpdaterExitCode::RuntimeError
        }
    }
    .into()
}

/// Run the daemon until a shutdown signal arrives
async fn run_daemon(settings: DaemonSettings) -> Result<(), DaemonError> {
    let (engine, listener, app) = start(&settings).await.map_err(DaemonError::Startup)?;
    serve(engine, listener, app, &settings.url_prefix)
        .await
        .map_err(DaemonError::Runtime)
}

/// Build every component and bind the listener
///
/// Nothing is running yet when this returns.
async fn start(settings: &DaemonSettings) -> Result<(UpdateEngine, TcpListener, Router)> {
    let config = &settings.updater;
    let metrics = Arc::new(UpdateMetrics::new(VERSION, COMMIT));

    let ip_source = Arc::new(HttpIpSource::new(config.ip_service.clone())?);
    let registrar = Arc::new(CloudflareRegistrar::new(
        config.email.clone(),
        config.api_key.clone(),
    )?);
    let reconciler = Reconciler::new(
        registrar,
        config.zone.clone(),
        config.host.clone(),
        Arc::clone(&metrics),
    );
    let engine = UpdateEngine::new(
        ip_source,
        reconciler,
        Arc::clone(&metrics),
        config.sleep_interval,
    )?;

    let app = server::router(&settings.url_prefix, metrics);

    let listener = TcpListener::bind(&settings.listen)
        .await
        .with_context(|| format!("Failed to listen on {}", settings.listen))?;

    Ok((engine, listener, app))
}

async fn serve(
    engine: UpdateEngine,
    listener: TcpListener,
    app: Router,
    url_prefix: &str,
) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let engine_task = tokio::spawn(async move { engine.run(shutdown_rx).await }.in_current_span());

    let addr = listener.local_addr()?;
    let mut server_shutdown = shutdown_tx.subscribe();
    let mut server_task = tokio::spawn(
        async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = server_shutdown.wait_for(|stop| *stop).await;
                })
                .await
        }
        .in_current_span(),
    );

    info!(
        version = VERSION,
        commit = COMMIT,
        url_prefix,
        "Listening on {}",
        addr
    );

    let signal = tokio::select! {
        signal = wait_for_shutdown_signal() => signal?,
        served = &mut server_task => {
            let _ = shutdown_tx.send(true);
            served??;
            return Err(anyhow!("HTTP server stopped unexpectedly"));
        }
    };

    info!("Received shutdown signal: {}", signal);
    let _ = shutdown_tx.send(true);

    let (engine_result, server_result) =
        tokio::time::timeout(SHUTDOWN_TIMEOUT, async { (engine_task.await, server_task.await) })
            .await
            .map_err(|_| anyhow!("Shutdown timeout after {:?}", SHUTDOWN_TIMEOUT))?;
    engine_result??;
    server_result??;

    info!("Shutting down daemon");
    Ok(())
}

/// Wait for SIGTERM or SIGINT
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let received = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(received)
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
