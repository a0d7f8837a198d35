//! Observability setup for GradePal: the global tracing subscriber with an
//! optional OpenTelemetry bridge.

pub mod tracing_setup;
