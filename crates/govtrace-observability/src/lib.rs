//! # govtrace-observability
//!
//! OpenTelemetry-based observability for the proposal decoder.
//!
//! ## Built-in metrics
//! - `govtrace.nodes_decoded`     — counter, tagged with chain
//! - `govtrace.nodes_failed`      — counter, tagged with chain + reason
//! - `govtrace.cache_hits`        — counter, tagged with artifact kind
//! - `govtrace.cache_misses`      — counter, tagged with artifact kind
//! - `govtrace.proxy_races`       — counter
//! - `govtrace.decode_latency_ms` — histogram
//!
//! ## Structured logging
//! JSON-structured logs compatible with ELK, Loki, CloudWatch.
//! Log levels configurable per component.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::DecoderMetrics;
pub use tracing_setup::{init_tracing, LogConfig, TracingConfig};
