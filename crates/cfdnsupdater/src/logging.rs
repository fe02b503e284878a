//! Log output setup
//!
//! Logs go to stdout. By default every event is one JSON object in Elastic
//! Common Schema style: `@timestamp`, `level`, `msg`, the fields of the
//! enclosing spans (service name, version, module) flattened to the top
//! level, then the event's own fields. `--no-json` switches to plain text.

use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::fmt::{self, Write as _};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Span, Subscriber};
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::format::{JsonFields, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormattedFields, MakeWriter};
use tracing_subscriber::registry::LookupSpan;

use crate::{COMMIT, VERSION};

/// Install the global subscriber
pub fn init(debug: bool, json: bool) -> Result<()> {
    let level = if debug { Level::DEBUG } else { Level::INFO };

    if json {
        tracing::subscriber::set_global_default(json_subscriber(level, std::io::stdout))?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .with_ansi(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

/// Subscriber writing ECS-style JSON lines to `writer`
pub fn json_subscriber<W>(level: Level, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(writer)
        .fmt_fields(JsonFields::new())
        .event_format(EcsFormat)
        .finish()
}

/// Span wrapping all daemon activity
pub fn root_span() -> Span {
    tracing::info_span!(
        "cfdnsupdater",
        service.name = "cfdnsupdater",
        service.version = VERSION,
        service.commit = COMMIT,
        event.module = "cloudflare",
    )
}

/// Flat JSON event format
///
/// Span fields are read back from the JSON that `JsonFields` stored in each
/// span's extensions, so the field formatter must be `JsonFields`.
pub struct EcsFormat;

impl<S> FormatEvent<S, JsonFields> for EcsFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, JsonFields>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut record = Map::new();
        record.insert(
            "@timestamp".to_string(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        record.insert(
            "level".to_string(),
            Value::from(event.metadata().level().to_string()),
        );

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                let extensions = span.extensions();
                if let Some(fields) = extensions.get::<FormattedFields<JsonFields>>() {
                    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&fields.fields) {
                        record.extend(map);
                    }
                }
            }
        }

        event.record(&mut FieldVisitor(&mut record));

        let line = serde_json::to_string(&record).map_err(|_| fmt::Error)?;
        writeln!(writer, "{line}")
    }
}

struct FieldVisitor<'a>(&'a mut Map<String, Value>);

impl FieldVisitor<'_> {
    fn insert(&mut self, field: &Field, value: Value) {
        let key = match field.name() {
            "message" => "msg",
            name => name,
        };
        self.0.insert(key.to_string(), value);
    }
}

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::from(format!("{value:?}")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn events(&self) -> Vec<Value> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    fn capture(level: Level, emit: impl FnOnce()) -> Vec<Value> {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = json_subscriber(level, move || writer.clone());
        tracing::subscriber::with_default(subscriber, emit);
        captured.events()
    }

    #[test]
    fn json_events_are_flat_ecs_objects() {
        let events = capture(Level::INFO, || {
            let span = root_span();
            let _entered = span.enter();
            tracing::info!(
                dns.question.name = "home.example.com",
                count = 2u64,
                "IP successfully changed"
            );
        });

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert!(event["@timestamp"].is_string());
        assert!(event.get("timestamp").is_none());
        assert!(event.get("span").is_none());
        assert_eq!(event["level"], "INFO");
        assert_eq!(event["msg"], "IP successfully changed");
        assert_eq!(event["service.name"], "cfdnsupdater");
        assert_eq!(event["service.version"], VERSION);
        assert_eq!(event["event.module"], "cloudflare");
        assert_eq!(event["dns.question.name"], "home.example.com");
        assert_eq!(event["count"], 2);
    }

    #[test]
    fn level_filter_applies() {
        let events = capture(Level::INFO, || {
            tracing::debug!("Got IP");
            tracing::warn!(value = %"abc", "Sleep interval ignored");
        });

        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["level"], "WARN");
        assert_eq!(events[0]["value"], "abc");
        assert!(events[0].get("service.name").is_none());
    }
}
