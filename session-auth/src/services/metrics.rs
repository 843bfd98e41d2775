use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub static SESSION_EVENTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

pub fn init_metrics() {
    let registry = Registry::new();

    let session_events = match IntCounterVec::new(
        Opts::new(
            "session_events_total",
            "Session lifecycle and authorization events by outcome",
        ),
        &["event", "outcome"],
    ) {
        Ok(metric) => metric,
        Err(e) => {
            tracing::error!("Failed to create session_events_total metric: {}", e);
            return;
        }
    };

    if let Err(e) = registry.register(Box::new(session_events.clone())) {
        tracing::error!("Failed to register session_events_total collector: {}", e);
        return;
    }

    let _ = REGISTRY.set(registry);
    let _ = SESSION_EVENTS_TOTAL.set(session_events);
}

/// Count one event. A no-op until [`init_metrics`] has run.
pub fn record(event: &str, outcome: &str) {
    if let Some(counter) = SESSION_EVENTS_TOTAL.get() {
        counter.with_label_values(&[event, outcome]).inc();
    }
}

pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return "# Failed to encode metrics\n".to_string();
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Metrics output is not valid UTF-8: {}", e);
        "# Metrics output is not valid UTF-8\n".to_string()
    })
}
