//! Prometheus wiring. The recorder is only installed when the flag is on;
//! the bulletin pipeline and the trace layer record against it unconditionally
//! and the calls become no-ops otherwise.

use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    describe();
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

/// Register the metrics this service emits so scrapes carry help text.
fn describe() {
    metrics::describe_counter!(
        "bulletins_generated_total",
        "Bulletins rendered from uploaded grade spreadsheets"
    );
    metrics::describe_counter!(
        "bulletin_import_failures_total",
        "Rendered bulletins Yparéo refused to accept"
    );
    metrics::describe_counter!("http_requests_total", "HTTP requests served, by status");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request latency in seconds, by status"
    );
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}
