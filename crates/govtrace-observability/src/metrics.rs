//! Decoder metrics definitions.
//!
//! All metrics use OpenTelemetry conventions and can be exported via OTLP
//! to Prometheus, Grafana, Datadog, etc.

use opentelemetry::{
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

/// Central metrics handle for one decoder process. Constructed once from
/// a `Meter` and threaded alongside `DecoderConfig` through the entry point.
#[derive(Clone)]
pub struct DecoderMetrics {
    pub nodes_decoded: Counter<u64>,
    pub nodes_failed: Counter<u64>,
    pub cache_hits: Counter<u64>,
    pub cache_misses: Counter<u64>,
    pub proxy_races: Counter<u64>,
    pub decode_latency_ms: Histogram<f64>,
}

impl DecoderMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            nodes_decoded: meter
                .u64_counter("govtrace.nodes_decoded")
                .with_description("Total number of call-tree nodes successfully decoded")
                .build(),
            nodes_failed: meter
                .u64_counter("govtrace.nodes_failed")
                .with_description("Call-tree nodes that fell back to a note instead of a decode")
                .build(),
            cache_hits: meter
                .u64_counter("govtrace.cache_hits")
                .with_description("Artifact store lookups served from cache")
                .build(),
            cache_misses: meter
                .u64_counter("govtrace.cache_misses")
                .with_description("Artifact store lookups that required a fetch")
                .build(),
            proxy_races: meter
                .u64_counter("govtrace.proxy_races")
                .with_description("Proxy-detection scheme races run")
                .build(),
            decode_latency_ms: meter
                .f64_histogram("govtrace.decode_latency_ms")
                .with_description("Time to decode one proposal, end to end, in milliseconds")
                .build(),
        }
    }

    pub fn record_node_decoded(&self, chain: &str) {
        self.nodes_decoded.add(1, &[KeyValue::new("chain", chain.to_string())]);
    }

    pub fn record_node_failed(&self, chain: &str, reason: &str) {
        self.nodes_failed.add(
            1,
            &[KeyValue::new("chain", chain.to_string()), KeyValue::new("reason", reason.to_string())],
        );
    }

    pub fn record_cache(&self, hit: bool, kind: &str) {
        let counter = if hit { &self.cache_hits } else { &self.cache_misses };
        counter.add(1, &[KeyValue::new("kind", kind.to_string())]);
    }

    pub fn record_proxy_race(&self) {
        self.proxy_races.add(1, &[]);
    }

    pub fn record_decode_latency(&self, ms: f64) {
        self.decode_latency_ms.record(ms, &[]);
    }
}
