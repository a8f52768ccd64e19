//! Tracing subscriber wiring.
//!
//! Three layers share one registry:
//!
//! - console output at the operator's chosen level (`RUST_LOG` overrides it);
//! - JSON lines at DEBUG appended to `logs/article_generator.log`;
//! - OpenTelemetry OTLP export, only when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::{runtime, Resource};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// File that receives every event as JSON.
pub const LOG_FILE: &str = "logs/article_generator.log";

const SERVICE_NAME: &str = "articlegen";

/// DEBUG for our crates; transport internals only from WARN, so the OTLP
/// exporter's own gRPC traffic is never exported.
const EXPORT_DIRECTIVES: &str =
    "debug,h2=warn,hyper=warn,hyper_util=warn,tonic=warn,tower=warn,rustls=warn,reqwest=info";

/// Keeps the exporter alive for the life of the process.
pub struct Telemetry {
    provider: Option<TracerProvider>,
}

impl Telemetry {
    /// Flushes pending spans.
    pub async fn shutdown(self) {
        let Some(provider) = self.provider else {
            return;
        };
        // The batch processor's flush blocks, so keep it off the runtime thread.
        let flushed = tokio::task::spawn_blocking(move || provider.shutdown()).await;
        if let Ok(Err(err)) = flushed {
            eprintln!("failed to flush traces: {err}");
        }
    }
}

/// Installs the global subscriber.
pub fn init(console_level: LevelFilter) -> anyhow::Result<Telemetry> {
    let console_filter = EnvFilter::builder()
        .with_default_directive(console_level.into())
        .from_env_lossy();
    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(console_filter);

    let file = open_log_file(Path::new(LOG_FILE))?;
    let json = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_writer(Mutex::new(file))
        .with_filter(export_filter());

    let provider = match std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        Ok(endpoint) if !endpoint.trim().is_empty() => Some(otlp_provider(endpoint.trim())?),
        _ => None,
    };
    let otel = provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer()
            .with_tracer(provider.tracer(SERVICE_NAME))
            .with_filter(export_filter())
    });

    tracing_subscriber::registry()
        .with(otel)
        .with(console)
        .with(json)
        .try_init()
        .context("installing tracing subscriber")?;

    Ok(Telemetry { provider })
}

/// Filter shared by the log file and the OTLP exporter.
fn export_filter() -> EnvFilter {
    EnvFilter::new(EXPORT_DIRECTIVES)
}

fn open_log_file(path: &Path) -> anyhow::Result<std::fs::File> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating log directory {}", dir.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}

fn otlp_provider(endpoint: &str) -> anyhow::Result<TracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .context("building OTLP span exporter")?;

    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::TokioCurrentThread)
        .with_resource(Resource::new([
            KeyValue::new("service.name", SERVICE_NAME),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        ]))
        .build())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::Context;

    use super::*;

    #[derive(Clone, Default)]
    struct Targets(Arc<Mutex<Vec<String>>>);

    impl<S: Subscriber> Layer<S> for Targets {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            self.0
                .lock()
                .unwrap()
                .push(event.metadata().target().to_owned());
        }
    }

    #[test]
    fn export_filter_keeps_debug_but_quiets_transport_crates() {
        let seen = Targets::default();
        let subscriber =
            tracing_subscriber::registry().with(seen.clone().with_filter(export_filter()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(target: "h2::codec", "frame received");
            tracing::debug!(target: "tonic::transport", "connecting");
            tracing::debug!(target: "hyper_util::client", "pooled connection");
            tracing::warn!(target: "h2", "connection reset");
            tracing::debug!(target: "nodes::retry", "retrying");
            tracing::trace!(target: "nodes::retry", "sleeping");
        });

        let seen = seen.0.lock().unwrap().clone();
        assert_eq!(seen, vec!["h2".to_owned(), "nodes::retry".to_owned()]);
    }
}
