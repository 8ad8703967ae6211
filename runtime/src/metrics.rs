//! Prometheus metrics for tracker observability.
//!
//! Every tracker records through the `metrics` facade, so nothing is collected
//! until a recorder is installed. [`MetricsExporter`] installs the Prometheus
//! recorder and renders the text exposition format:
//!
//! ```rust,no_run
//! use async_tracker_runtime::metrics::MetricsExporter;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut exporter = MetricsExporter::new();
//! exporter.install()?;
//!
//! // ... drive some trackers ...
//!
//! if let Some(text) = exporter.render() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

use async_tracker_core::{EventTag, StateTag};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, histogram};

/// Transitions applied, labelled `from` and `to`
pub const TRANSITIONS_TOTAL: &str = "tracker_transitions_total";
/// Events with no table entry, labelled `state` and `event`
pub const EVENTS_IGNORED_TOTAL: &str = "tracker_events_ignored_total";
/// Completions dropped by the liveness guard
pub const COMPLETIONS_SUPPRESSED_TOTAL: &str = "tracker_completions_suppressed_total";
/// Producers that returned a plain value
pub const INVALID_PRODUCER_TOTAL: &str = "tracker_invalid_producer_total";
/// Lifecycle callbacks invoked, labelled `callback`
pub const CALLBACKS_TOTAL: &str = "tracker_callbacks_total";
/// Time from entering `Loading` to settling
pub const OPERATION_DURATION_SECONDS: &str = "tracker_operation_duration_seconds";

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus metrics exporter.
///
/// Installs the global recorder; scraping is left to the host, which can
/// serve [`render`](Self::render) however it likes.
#[derive(Default)]
pub struct MetricsExporter {
    handle: Option<PrometheusHandle>,
}

impl MetricsExporter {
    /// Create an exporter that has not been installed yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Describe tracker metrics and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// If a recorder is already installed (e.g., by another test), this logs a
    /// warning and succeeds without a handle.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!("Prometheus recorder installed");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this exporter did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

impl std::fmt::Debug for MetricsExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsExporter")
            .field("installed", &self.handle.is_some())
            .finish()
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    describe_counter!(TRANSITIONS_TOTAL, "Total number of state transitions applied");
    describe_counter!(
        EVENTS_IGNORED_TOTAL,
        "Total number of events with no transition from the current state"
    );
    describe_counter!(
        COMPLETIONS_SUPPRESSED_TOTAL,
        "Total number of async completions dropped because the owner was gone"
    );
    describe_counter!(
        INVALID_PRODUCER_TOTAL,
        "Total number of producers that did not return a deferred value"
    );
    describe_counter!(CALLBACKS_TOTAL, "Total number of lifecycle callbacks invoked");
    describe_histogram!(
        OPERATION_DURATION_SECONDS,
        "Time from entering loading until the operation settled"
    );
}

/// Tracker metrics recorder.
pub struct TrackerMetrics;

impl TrackerMetrics {
    /// Record an applied transition.
    pub fn record_transition(from: StateTag, to: StateTag) {
        counter!(TRANSITIONS_TOTAL, "from" => from.as_str(), "to" => to.as_str()).increment(1);
    }

    /// Record an event the table ignored.
    pub fn record_ignored(state: StateTag, event: EventTag) {
        counter!(EVENTS_IGNORED_TOTAL, "state" => state.as_str(), "event" => event.as_str())
            .increment(1);
    }

    /// Record a completion dropped by the liveness guard.
    pub fn record_suppressed() {
        counter!(COMPLETIONS_SUPPRESSED_TOTAL).increment(1);
    }

    /// Record a producer that returned a plain value.
    pub fn record_invalid_producer() {
        counter!(INVALID_PRODUCER_TOTAL).increment(1);
    }

    /// Record a lifecycle callback invocation.
    pub fn record_callback(callback: &'static str) {
        counter!(CALLBACKS_TOTAL, "callback" => callback).increment(1);
    }

    /// Record how long an operation stayed in `Loading`.
    pub fn record_operation(outcome: StateTag, duration: Duration) {
        histogram!(OPERATION_DURATION_SECONDS, "outcome" => outcome.as_str())
            .record(duration.as_secs_f64());
    }
}
