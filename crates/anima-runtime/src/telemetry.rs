//! Telemetry bootstrap for Anima.
//!
//! Call [`init_tracing`] once at process startup to wire up the `tracing`
//! subscriber with an optional OTLP span exporter.
//!
//! # Environment variables
//!
//! | Variable | Effect |
//! |---|---|
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | OTLP collector base URL (e.g. `http://localhost:4318`). When set the OTLP HTTP exporter is activated. |
//! | `RUST_LOG` | Log filter (default `"info"`). |
//! | `ANIMA_LOG_FORMAT=json` | Emit newline-delimited JSON logs. |

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise the global `tracing` subscriber, with OTLP span export when
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is set and a plain console formatter
/// otherwise.
///
/// The returned [`TelemetryGuard`] must be held for the lifetime of the
/// process; dropping it flushes pending span batches.
pub fn init_tracing(service_name: &str) -> TelemetryGuard {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let use_json = std::env::var("ANIMA_LOG_FORMAT").as_deref() == Ok("json");

    let provider = build_provider(service_name);
    let registry = tracing_subscriber::registry().with(env_filter);

    match (&provider, use_json) {
        (Some(p), true) => {
            let otel = tracing_opentelemetry::layer().with_tracer(p.tracer("anima"));
            registry
                .with(otel)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        (Some(p), false) => {
            let otel = tracing_opentelemetry::layer().with_tracer(p.tracer("anima"));
            registry
                .with(otel)
                .with(tracing_subscriber::fmt::layer().compact())
                .init();
        }
        (None, true) => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        (None, false) => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .init(),
    }

    TelemetryGuard(provider)
}

/// RAII guard that shuts down the OTel tracer provider on drop, flushing
/// any pending spans before the process exits.
pub struct TelemetryGuard(Option<SdkTracerProvider>);

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.0.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("[anima] OpenTelemetry provider shutdown error: {e}");
        }
    }
}

/// Build a tracer provider when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
///
/// Returns `None` when the variable is absent or the exporter cannot be
/// initialised; the caller falls back to plain console output.
fn build_provider(service_name: &str) -> Option<SdkTracerProvider> {
    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok()?;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| eprintln!("[anima] OTLP exporter init failed: {e}"))
        .ok()?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    // Simple (synchronous) exporter: the CLI creates its Tokio runtime only
    // after calling init_tracing, so a batch exporter that spawns tasks would
    // have nothing to run on at init time.
    Some(
        SdkTracerProvider::builder()
            .with_resource(resource)
            .with_simple_exporter(exporter)
            .build(),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_provider_returns_none_without_endpoint() {
        // SAFETY: single-threaded test; no other thread reads this env-var.
        unsafe { std::env::remove_var("OTEL_EXPORTER_OTLP_ENDPOINT") };
        assert!(build_provider("anima-test").is_none());
    }

    #[test]
    fn guard_drop_without_provider_is_safe() {
        let guard = TelemetryGuard(None);
        drop(guard); // must not panic
    }
}
