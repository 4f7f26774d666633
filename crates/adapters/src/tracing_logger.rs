//! Logger adapter forwarding structured events to `tracing`.

use notify_url_ports::{LogEvent, LogFields, LogLevel, LoggerPort};
use notify_url_shared::{REDACTED, is_secret_key};
use serde_json::Value;

/// Forwards events to the active `tracing` subscriber.
///
/// Fields are rendered as one JSON object under the `fields` key; secret
/// looking keys are masked first.
#[derive(Debug, Clone, Default)]
pub struct TracingLogger {
    base_fields: LogFields,
}

impl TracingLogger {
    /// Logger without base fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn render_fields(base: &LogFields, extra: Option<LogFields>) -> String {
    let mut merged = base.clone();
    merged.extend(extra.unwrap_or_default());
    let object: serde_json::Map<String, Value> = merged
        .into_iter()
        .map(|(key, value)| {
            let value = if is_secret_key(&key) {
                Value::from(REDACTED)
            } else {
                value
            };
            (key.into_string(), value)
        })
        .collect();
    Value::Object(object).to_string()
}

impl LoggerPort for TracingLogger {
    fn log(&self, event: LogEvent) {
        let fields = render_fields(&self.base_fields, event.fields);
        let name = &*event.event;
        let message = &*event.message;
        match event.level {
            LogLevel::Debug => tracing::debug!(event = name, fields = %fields, "{message}"),
            LogLevel::Info => tracing::info!(event = name, fields = %fields, "{message}"),
            LogLevel::Warn => tracing::warn!(event = name, fields = %fields, "{message}"),
            LogLevel::Error => tracing::error!(event = name, fields = %fields, "{message}"),
        }
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut base_fields = self.base_fields.clone();
        base_fields.extend(fields);
        Box::new(Self { base_fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rendered_fields_mask_secrets() -> Result<(), serde_json::Error> {
        let base = LogFields::from([("scheme".into(), json!("join"))]);
        let extra = LogFields::from([("apikey".into(), json!("abc"))]);
        let rendered: Value = serde_json::from_str(&render_fields(&base, Some(extra)))?;
        assert_eq!(rendered, json!({ "scheme": "join", "apikey": REDACTED }));
        Ok(())
    }

    #[test]
    fn logging_without_a_subscriber_is_a_no_op() {
        TracingLogger::new()
            .child(LogFields::new())
            .info("service.initialized", "configured", None);
    }
}
