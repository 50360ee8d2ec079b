use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
static PROMETHEUS_REGISTRY: OnceLock<Registry> = OnceLock::new();
static LEDGER_OPERATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Install the recorder and register the custom counters.
///
/// Safe to call more than once; the first caller wins (integration tests
/// build several applications in one process).
pub fn init_metrics() {
    if let Ok(handle) = PrometheusBuilder::new().install_recorder() {
        METRICS_HANDLE.set(handle).ok();
    }

    PROMETHEUS_REGISTRY.get_or_init(|| {
        let registry = Registry::new();

        let operations = IntCounterVec::new(
            Opts::new(
                "ledger_operations_total",
                "Completed ledger operations by operation",
            ),
            &["operation"],
        )
        .expect("failed to create ledger_operations_total metric");

        registry
            .register(Box::new(operations.clone()))
            .expect("failed to register ledger_operations_total");

        LEDGER_OPERATIONS_TOTAL.set(operations).ok();
        registry
    });
}

/// Render everything the recorder and the custom registry hold.
pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string());

    if let Some(registry) = PROMETHEUS_REGISTRY.get() {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&registry.gather(), &mut buffer).ok();
        if let Ok(custom) = String::from_utf8(buffer) {
            output.push_str(&custom);
        }
    }

    output
}

/// Count a completed ledger operation.
pub fn record_operation(operation: &str) {
    if let Some(counter) = LEDGER_OPERATIONS_TOTAL.get() {
        counter.with_label_values(&[operation]).inc();
    }
}
