use crate::error::{Result, SqlChatError};
use opentelemetry::{trace::TracerProvider as _, KeyValue};
use opentelemetry_sdk::Resource;
use std::env;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_DIR: &str = "logs";

/// flushes the log file and exported spans on drop
pub struct TracingGuard {
    _file_guard: WorkerGuard,
    log_file: PathBuf,
    tracer_provider: Option<opentelemetry_sdk::trace::SdkTracerProvider>,
}

impl TracingGuard {
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            // flush remaining traces on shutdown
            if let Err(e) = provider.shutdown() {
                eprintln!("error shutting down tracer provider: {}", e);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct TracingSettings {
    pub log_dir: PathBuf,
    /// otlp collector; `None` keeps tracing local
    pub otlp_endpoint: Option<String>,
}

impl TracingSettings {
    pub fn from_env() -> Self {
        let log_dir = env::var("SQLCHAT_LOG_DIR")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR));

        let enabled = env::var("SQLCHAT_ENABLE_TRACING")
            .map(|v| {
                let v = v.to_lowercase();
                v == "1" || v == "true" || v == "yes"
            })
            .unwrap_or(false);

        let otlp_endpoint = if enabled {
            env::var("PHOENIX_COLLECTOR_ENDPOINT")
                .or_else(|_| env::var("OTEL_EXPORTER_OTLP_ENDPOINT"))
                .ok()
        } else {
            None
        };

        Self {
            log_dir,
            otlp_endpoint,
        }
    }
}

/// `app_log_<YYYY-MM-DD_HH-MM-SS>` prefix for the session log file
pub fn log_file_prefix(now: chrono::NaiveDateTime) -> String {
    format!("app_log_{}", now.format("%Y-%m-%d_%H-%M-%S"))
}

pub fn init_tracing(service_name: &str) -> Result<TracingGuard> {
    init_tracing_with(service_name, &TracingSettings::from_env())
}

/// console + timestamped file logging, with an optional otlp exporter
pub fn init_tracing_with(service_name: &str, settings: &TracingSettings) -> Result<TracingGuard> {
    std::fs::create_dir_all(&settings.log_dir)?;

    let prefix = log_file_prefix(chrono::Local::now().naive_local());
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(&prefix)
        .filename_suffix("log")
        .build(&settings.log_dir)
        .map_err(|e| SqlChatError::Tracing(format!("log file setup failed: {}", e)))?;
    let log_file = settings.log_dir.join(format!("{}.log", prefix));

    let (file_writer, file_guard) = tracing_appender::non_blocking(appender);

    let tracer_provider = match &settings.otlp_endpoint {
        Some(endpoint) => Some(build_tracer_provider(service_name, endpoint)?),
        None => None,
    };

    // bridge tracing to opentelemetry when an exporter is configured
    let telemetry = tracer_provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer(service_name.to_string()))
    });

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(telemetry)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .try_init()
        .map_err(|e| SqlChatError::Tracing(e.to_string()))?;

    match &settings.otlp_endpoint {
        Some(endpoint) => tracing::info!(
            "logging to {} with opentelemetry export for {} (endpoint: {})",
            log_file.display(),
            service_name,
            endpoint
        ),
        None => tracing::info!(
            "logging initialized for {} (file: {})",
            service_name,
            log_file.display()
        ),
    }

    Ok(TracingGuard {
        _file_guard: file_guard,
        log_file,
        tracer_provider,
    })
}

fn build_tracer_provider(
    service_name: &str,
    endpoint: &str,
) -> Result<opentelemetry_sdk::trace::SdkTracerProvider> {
    use opentelemetry_otlp::WithExportConfig;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| SqlChatError::Tracing(format!("exporter build failed: {}", e)))?;

    let resource = Resource::builder_empty()
        .with_attribute(KeyValue::new("service.name", service_name.to_string()))
        .build();

    Ok(opentelemetry_sdk::trace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build())
}
