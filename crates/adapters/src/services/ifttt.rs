//! IFTTT webhook triggers (`ifttt://webhookid?events=a,b`).

use super::Configured;
use notify_url_format::{ConfigRecord, Params, UrlContext};
use notify_url_ports::{
    ConfigError, HttpMethod, LoggerPort, NotificationService, PreparedRequest, ServiceError,
};
use serde::Serialize;
use std::sync::Arc;
use url::Url;

/// URL scheme of the service.
pub const SCHEME: &str = "ifttt";

const TRIGGER_URL: &str = "https://maker.ifttt.com/trigger";

/// IFTTT configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, ConfigRecord)]
#[config(scheme = "ifttt", validate = "validate_ifttt")]
pub struct IftttConfig {
    /// Webhook key from the Maker settings page
    #[config(url = "host")]
    pub webhook_id: String,
    /// Event names, one trigger per event
    pub events: Vec<String>,
    /// First event value
    #[config(optional)]
    pub value1: String,
    /// Second event value
    #[config(optional)]
    pub value2: String,
    /// Third event value
    #[config(optional)]
    pub value3: String,
    /// Value slot (1-3) that receives the message
    #[config(key = "messagevalue", default = "2")]
    pub use_message_as_value: u8,
    /// Value slot (1-3) that receives the title, 0 to disable
    #[config(key = "titlevalue", default = "0")]
    pub use_title_as_value: u8,
    /// Notification title, optionally set by the sender
    #[config(optional)]
    pub title: String,
}

fn validate_ifttt(config: &IftttConfig, _context: &UrlContext<'_>) -> Result<(), ConfigError> {
    check_slots(config)
}

fn check_slots(config: &IftttConfig) -> Result<(), ConfigError> {
    if !(1..=3).contains(&config.use_message_as_value) {
        return Err(ConfigError::validation(
            "use_message_as_value",
            "must be one of 1, 2 or 3",
        ));
    }
    if config.use_title_as_value > 3 {
        return Err(ConfigError::validation(
            "use_title_as_value",
            "must be one of 0, 1, 2 or 3",
        ));
    }
    if config.use_title_as_value == config.use_message_as_value {
        return Err(ConfigError::validation(
            "use_title_as_value",
            "title and message cannot share a value slot",
        ));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct TriggerPayload<'a> {
    value1: &'a str,
    value2: &'a str,
    value3: &'a str,
}

impl<'a> TriggerPayload<'a> {
    fn slot(&mut self, index: u8) -> Option<&mut &'a str> {
        match index {
            1 => Some(&mut self.value1),
            2 => Some(&mut self.value2),
            3 => Some(&mut self.value3),
            _ => None,
        }
    }
}

/// IFTTT service.
pub struct IftttService {
    inner: Configured<IftttConfig>,
}

impl IftttService {
    /// Configure the service from its URL.
    pub fn from_url(url: &Url, logger: &Arc<dyn LoggerPort>) -> Result<Self, ServiceError> {
        Ok(Self {
            inner: Configured::from_url(url, logger)?,
        })
    }

    /// Parsed configuration.
    #[must_use]
    pub const fn config(&self) -> &IftttConfig {
        &self.inner.config
    }
}

impl NotificationService for IftttService {
    fn id(&self) -> &'static str {
        SCHEME
    }

    fn config_url(&self) -> Result<Url, ConfigError> {
        self.inner.config_url()
    }

    fn prepare(
        &self,
        message: &str,
        params: &Params,
    ) -> Result<Vec<PreparedRequest>, ServiceError> {
        let config = self.inner.with_params(params)?;
        check_slots(&config)?;

        let mut payload = TriggerPayload {
            value1: &config.value1,
            value2: &config.value2,
            value3: &config.value3,
        };
        if let Some(slot) = payload.slot(config.use_title_as_value) {
            *slot = &config.title;
        }
        if let Some(slot) = payload.slot(config.use_message_as_value) {
            *slot = message;
        }

        let requests = config
            .events
            .iter()
            .map(|event| -> Result<PreparedRequest, ServiceError> {
                let mut url = Url::parse(TRIGGER_URL)?;
                url.path_segments_mut()
                    .map_err(|()| ServiceError::InvalidUrl {
                        reason: "trigger URL cannot be a base".to_string(),
                    })?
                    .extend([event.as_str(), "with", "key", config.webhook_id.as_str()]);
                PreparedRequest::new(HttpMethod::Post, &url).json(&payload)
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.inner.prepared(requests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::logger;
    use std::error::Error;

    fn service(url: &str) -> Result<IftttService, ServiceError> {
        let (_, logger) = logger();
        IftttService::from_url(&Url::parse(url)?, &logger)
    }

    #[test]
    fn parses_events_and_slots() -> Result<(), Box<dyn Error>> {
        let service = service("ifttt://hookid?events=disk,cpu&value3=host-1&titlevalue=1")?;
        let config = service.config();
        assert_eq!(config.webhook_id, "hookid");
        assert_eq!(config.events, vec!["disk", "cpu"]);
        assert_eq!(config.use_message_as_value, 2);
        assert_eq!(config.use_title_as_value, 1);
        assert_eq!(
            service.config_url()?.as_str(),
            "ifttt://hookid?events=disk%2Ccpu&titlevalue=1&value3=host-1"
        );
        Ok(())
    }

    #[test]
    fn events_are_required() {
        assert_eq!(
            service("ifttt://hookid").err(),
            Some(ServiceError::Config(ConfigError::MissingField { field: "events" }))
        );
    }

    #[test]
    fn slot_rules_are_enforced() {
        for url in [
            "ifttt://hookid?events=a&messagevalue=0",
            "ifttt://hookid?events=a&messagevalue=4",
            "ifttt://hookid?events=a&titlevalue=4",
            "ifttt://hookid?events=a&titlevalue=2",
        ] {
            assert!(
                matches!(
                    service(url).err(),
                    Some(ServiceError::Config(ConfigError::Validation { .. }))
                ),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn params_are_rechecked_before_sending() -> Result<(), Box<dyn Error>> {
        let service = service("ifttt://hookid?events=a")?;
        let params = Params::from([("titlevalue".to_string(), "2".to_string())]);
        assert!(matches!(
            service.prepare("hi", &params).err(),
            Some(ServiceError::Config(ConfigError::Validation { .. }))
        ));
        Ok(())
    }

    #[test]
    fn prepare_triggers_each_event() -> Result<(), Box<dyn Error>> {
        let service =
            service("ifttt://hookid?events=disk,cpu&value1=v1&value3=v3&titlevalue=3")?;
        let params = Params::from([("title".to_string(), "Alert".to_string())]);
        let requests = service.prepare("disk full", &params)?;

        let urls: Vec<&str> = requests.iter().map(|request| request.url.as_str()).collect();
        assert_eq!(
            urls,
            [
                "https://maker.ifttt.com/trigger/disk/with/key/hookid",
                "https://maker.ifttt.com/trigger/cpu/with/key/hookid",
            ]
        );
        let request = requests.first().ok_or("no request")?;
        let body: serde_json::Value =
            serde_json::from_str(request.body.as_deref().unwrap_or("{}"))?;
        assert_eq!(
            body,
            serde_json::json!({ "value1": "v1", "value2": "disk full", "value3": "Alert" })
        );
        Ok(())
    }
}
