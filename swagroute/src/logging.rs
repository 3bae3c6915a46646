//! Installs the global tracing subscriber

use std::fmt;
use std::fmt::Debug;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::field::Field;
use tracing::Event;
use tracing::Level;
use tracing::Span;
use tracing::Subscriber;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::FormatEvent;
use tracing_subscriber::fmt::FormatFields;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

use crate::settings::LogFormat;
use crate::settings::Settings;

/// Installs a global subscriber writing to stdout in the configured [`LogFormat`]
///
/// The filter is read from `RUST_LOG` and defaults to `info`.
pub fn init_tracing(settings: &Settings) -> Result<(), TryInitError> {
    let format = match settings.log_format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .event_format(FlatJson {
                service_name: settings.service_name.clone(),
            })
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new(Level::INFO.as_str())))
        .with(format)
        .try_init()
}

/// [`Format`](tracing_subscriber::fmt::format::Format) for `tracing_subscriber::fmt` layer.
///
/// It formats each event as its own self-contained flat JSON log line,
/// similar to the [`Json`](tracing_subscriber::fmt::format::Json) format.
///
/// It has at least the following keys:
/// - `service_name`
/// - `timestamp`
/// - `level`
/// - `target`
///
/// It may also have the following keys:
/// - `message`
/// - `filename`
/// - `line_number`
/// - `span_name`
///
/// Additionally, it may have any custom key-value pair defined for the event.
#[derive(Debug, Clone)]
pub struct FlatJson {
    /// Value of the `service_name` key
    pub service_name: String,
}

impl<S, N> FormatEvent<S, N> for FlatJson
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();

        let mut json = JsonVisitor::default();
        json.insert("service_name", self.service_name.clone());
        json.insert(
            "timestamp",
            OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_else(|_| "ERROR".to_string()),
        );
        json.insert("level", meta.level().to_string());
        json.insert("target", meta.target().to_string());
        if let Some(filename) = meta.file() {
            json.insert("filename", filename.to_string());
        }
        if let Some(line_number) = meta.line() {
            json.insert("line_number", line_number);
        }
        if let Some(metadata) = Span::current().metadata() {
            json.insert("span_name", metadata.name().to_string());
        }

        event.record(&mut json);

        writeln!(writer, "{}", serde_json::Value::Object(json.0))
    }
}

#[derive(Default)]
struct JsonVisitor(serde_json::Map<String, serde_json::Value>);

impl JsonVisitor {
    fn insert(&mut self, key: impl ToString, value: impl Into<serde_json::Value>) {
        self.0.insert(key.to_string(), value.into());
    }
}

impl tracing::field::Visit for JsonVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field.name(), value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field.name(), value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field.name(), value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field.name(), value);
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field.name(), value);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        self.insert(field.name(), format!("{value:?}"));
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Arc;
    use std::sync::Mutex;

    use serde_json::Value;

    use super::*;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn events_are_flat_json_lines() {
        let buffer = Buffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .event_format(FlatJson {
                    service_name: "calculator".to_string(),
                })
                .with_writer(move || writer.clone()),
        );

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(paths = 2, api = "default", "Assembled openapi document");
        });

        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let line: Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(line["service_name"], "calculator");
        assert_eq!(line["level"], "INFO");
        assert_eq!(line["message"], "Assembled openapi document");
        assert_eq!(line["paths"], 2);
        assert_eq!(line["api"], "default");
        assert!(line["timestamp"].is_string());
    }
}
