//! Update metrics
//!
//! Process-wide counters shared between the update loop and the HTTP front,
//! exported in the Prometheus text exposition format.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Content type of [`UpdateMetrics::export_prometheus`] output
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Metrics collector for the update loop
///
/// Shared as `Arc<UpdateMetrics>`. All counters are monotonic and only ever
/// incremented, so relaxed atomics are sufficient.
#[derive(Debug)]
pub struct UpdateMetrics {
    /// Records created or changed
    update_count: AtomicU64,
    /// Completed update cycles (successful or not)
    cycles: AtomicU64,
    /// Failed IP discovery attempts
    resolve_errors: AtomicU64,
    /// Failed reconciliations
    reconcile_errors: AtomicU64,
    /// Process start time in seconds since the Unix epoch
    start_time_secs: f64,
    version: String,
    commit: String,
}

impl UpdateMetrics {
    /// Create a new metrics collector
    pub fn new(version: impl Into<String>, commit: impl Into<String>) -> Self {
        let start_time_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();

        Self {
            update_count: AtomicU64::new(0),
            cycles: AtomicU64::new(0),
            resolve_errors: AtomicU64::new(0),
            reconcile_errors: AtomicU64::new(0),
            start_time_secs,
            version: version.into(),
            commit: commit.into(),
        }
    }

    /// Increment the update counter (record created or changed)
    pub fn record_update(&self) {
        self.update_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the completed cycle counter
    pub fn record_cycle(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the IP discovery failure counter
    pub fn record_resolve_error(&self) {
        self.resolve_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the reconciliation failure counter
    pub fn record_reconcile_error(&self) {
        self.reconcile_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of records created or changed so far
    pub fn update_count(&self) -> u64 {
        self.update_count.load(Ordering::Relaxed)
    }

    /// Number of completed update cycles
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// Number of failed IP discovery attempts
    pub fn resolve_errors(&self) -> u64 {
        self.resolve_errors.load(Ordering::Relaxed)
    }

    /// Number of failed reconciliations
    pub fn reconcile_errors(&self) -> u64 {
        self.reconcile_errors.load(Ordering::Relaxed)
    }

    /// Export metrics in Prometheus format
    pub fn export_prometheus(&self) -> String {
        let mut output = String::new();

        output.push_str("# HELP cfdnsupdater_update_count The number of DNS updates completed\n");
        output.push_str("# TYPE cfdnsupdater_update_count counter\n");
        let _ = writeln!(output, "cfdnsupdater_update_count {}", self.update_count());

        output.push_str("# HELP cfdnsupdater_cycles_total The number of update cycles completed\n");
        output.push_str("# TYPE cfdnsupdater_cycles_total counter\n");
        let _ = writeln!(output, "cfdnsupdater_cycles_total {}", self.cycles());

        output.push_str("# HELP cfdnsupdater_errors_total Failed update cycle steps by stage\n");
        output.push_str("# TYPE cfdnsupdater_errors_total counter\n");
        let _ = writeln!(
            output,
            "cfdnsupdater_errors_total{{stage=\"resolve\"}} {}",
            self.resolve_errors()
        );
        let _ = writeln!(
            output,
            "cfdnsupdater_errors_total{{stage=\"reconcile\"}} {}",
            self.reconcile_errors()
        );

        output.push_str("# HELP cfdnsupdater_build_info Build information\n");
        output.push_str("# TYPE cfdnsupdater_build_info gauge\n");
        let _ = writeln!(
            output,
            "cfdnsupdater_build_info{{version=\"{}\",commit=\"{}\"}} 1",
            escape_label(&self.version),
            escape_label(&self.commit)
        );

        output.push_str(
            "# HELP process_start_time_seconds Start time of the process since unix epoch in seconds.\n",
        );
        output.push_str("# TYPE process_start_time_seconds gauge\n");
        let _ = writeln!(output, "process_start_time_seconds {}", self.start_time_secs);

        output
    }
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
