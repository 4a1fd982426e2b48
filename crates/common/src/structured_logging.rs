use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::time::Instant;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Layer, Registry};
use uuid::Uuid;

/// Структурированная запись лога в JSON формате
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredLogEntry {
    /// Временная метка в ISO 8601 формате
    pub timestamp: String,
    pub level: String,
    /// Целевой модуль/компонент
    pub target: String,
    pub message: String,
    /// Дополнительные поля (section_id, claimed, fetch_id, ...)
    #[serde(flatten)]
    pub fields: HashMap<String, Value>,
}

/// Форматтер для JSON логов
pub struct JsonFormatter;

impl<S> Layer<S> for JsonFormatter
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let entry = StructuredLogEntry::from_event(event);
        if let Ok(json) = serde_json::to_string(&entry) {
            let _ = writeln!(io::stderr(), "{}", json);
        }
    }
}

impl StructuredLogEntry {
    fn from_event(event: &Event<'_>) -> Self {
        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);

        Self {
            timestamp: Utc::now().to_rfc3339(),
            level: level_name(*event.metadata().level()).to_string(),
            target: event.metadata().target().to_string(),
            message: visitor.message.unwrap_or_default(),
            fields: visitor.fields,
        }
    }
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARN",
        Level::INFO => "INFO",
        Level::DEBUG => "DEBUG",
        Level::TRACE => "TRACE",
    }
}

/// Визитор для извлечения полей из события
#[derive(Default)]
struct JsonVisitor {
    message: Option<String>,
    fields: HashMap<String, Value>,
}

impl Visit for JsonVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(
                field.name().to_string(),
                Value::String(format!("{:?}", value)),
            );
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields
                .insert(field.name().to_string(), Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields
            .insert(field.name().to_string(), Value::Number(value.into()));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields
            .insert(field.name().to_string(), Value::Number(value.into()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields
            .insert(field.name().to_string(), Value::Bool(value));
    }
}

/// Конфигурация для structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Минимальный уровень логирования (RUST_LOG имеет приоритет)
    pub level: String,
    /// Вывод в JSON формате
    pub json_output: bool,
    /// Включить цветной вывод (только для non-JSON)
    pub color_output: bool,
    pub include_line_numbers: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json_output: false,
            color_output: true,
            include_line_numbers: cfg!(debug_assertions),
        }
    }
}

/// Инициализировать structured logging
pub fn init_structured_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    if config.json_output {
        let subscriber = Registry::default().with(env_filter).with(JsonFormatter);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        // Человекочитаемый формат, логи идут в stderr чтобы не мешать выводу
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_target(true)
            .with_line_number(config.include_line_numbers)
            .with_ansi(config.color_output);

        let subscriber = Registry::default().with(env_filter).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

/// Замер операции: поля копятся до `finish`, результат уходит в лог одной записью
pub struct OperationTimer {
    operation: &'static str,
    started: Instant,
    fields: Vec<(&'static str, String)>,
}

impl OperationTimer {
    pub fn start(operation: &'static str) -> Self {
        Self {
            operation,
            started: Instant::now(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.fields.push((key, value.to_string()));
        self
    }

    fn rendered_fields(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Debug on success, warn on failure; returns the elapsed milliseconds
    pub fn finish<T, E: fmt::Display>(self, result: &Result<T, E>) -> u64 {
        let duration_ms = self.started.elapsed().as_millis() as u64;
        let fields = self.rendered_fields();

        match result {
            Ok(_) => tracing::debug!(
                operation = self.operation,
                duration_ms,
                %fields,
                "operation completed"
            ),
            Err(e) => tracing::warn!(
                operation = self.operation,
                duration_ms,
                %fields,
                error = %e,
                "operation failed"
            ),
        }
        duration_ms
    }
}

/// Идентификатор одного запуска CLI, проходит через все записи лога
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    started: Instant,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            started: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}
