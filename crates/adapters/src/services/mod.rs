//! Notification service adapters, one configuration record each.

pub mod bark;
pub mod ifttt;
pub mod join;
pub mod ntfy;
pub mod teams;

use notify_url_format::{ConfigRecord, Params, PropertyResolver, redact_url};
use notify_url_ports::{ConfigError, LogFields, LoggerPort, PreparedRequest, ServiceError};
use serde_json::json;
use std::sync::Arc;
use url::Url;

/// Configuration shared by every adapter: the parsed record, its resolver and
/// the logger.
pub(crate) struct Configured<R> {
    pub(crate) config: R,
    resolver: PropertyResolver<R>,
    logger: Box<dyn LoggerPort>,
}

impl<R: ConfigRecord> Configured<R> {
    /// Parse the record from its URL once, at service construction.
    pub(crate) fn from_url(url: &Url, logger: &Arc<dyn LoggerPort>) -> Result<Self, ServiceError> {
        let resolver = PropertyResolver::<R>::new()?;
        let mut config = R::default();
        resolver.set_url(&mut config, url)?;

        let scheme = resolver.schema().scheme();
        let logger = logger.child(LogFields::from([("scheme".into(), json!(scheme))]));
        logger.debug(
            "service.initialized",
            "service configured from URL",
            Some(LogFields::from([("url".into(), json!(redact_url(url)))])),
        );
        Ok(Self {
            config,
            resolver,
            logger,
        })
    }

    pub(crate) fn config_url(&self) -> Result<Url, ConfigError> {
        self.resolver.get_url(&self.config)
    }

    /// Send-scoped copy with per-message overrides applied.
    pub(crate) fn with_params(&self, params: &Params) -> Result<R, ServiceError> {
        Ok(self.resolver.with_params(&self.config, params)?)
    }

    pub(crate) fn prepared(
        &self,
        requests: Vec<PreparedRequest>,
    ) -> Result<Vec<PreparedRequest>, ServiceError> {
        self.logger.debug(
            "service.request_prepared",
            "request prepared",
            Some(LogFields::from([("requests".into(), json!(requests.len()))])),
        );
        Ok(requests)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::log_sink::MemoryLogSink;
    use crate::logger::JsonLogger;
    use notify_url_ports::{LogLevel, LoggerPort};
    use std::sync::Arc;

    pub(crate) fn logger() -> (Arc<MemoryLogSink>, Arc<dyn LoggerPort>) {
        let sink = Arc::new(MemoryLogSink::default());
        let logger: Arc<dyn LoggerPort> =
            Arc::new(JsonLogger::new(sink.clone()).with_min_level(LogLevel::Debug));
        (sink, logger)
    }
}
