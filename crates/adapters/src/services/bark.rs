//! Bark push notifications (`bark://:devicekey@host/path`).

use super::Configured;
use notify_url_format::{ConfigRecord, Params};
use notify_url_ports::{
    ConfigError, HttpMethod, LoggerPort, NotificationService, PreparedRequest, ServiceError,
};
use notify_url_shared::SecretString;
use serde::Serialize;
use std::sync::Arc;
use url::Url;

/// URL scheme of the service.
pub const SCHEME: &str = "bark";

/// Bark configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, ConfigRecord)]
#[config(scheme = "bark", user = "")]
pub struct BarkConfig {
    /// Server hostname and port
    #[config(url = "host")]
    pub host: String,
    /// Server path
    #[config(url = "path", default = "")]
    pub path: String,
    /// The key for each device
    #[config(url = "password")]
    pub device_key: SecretString,
    /// Notification title, optionally set by the sender
    #[config(default = "")]
    pub title: String,
    /// Server protocol, http or https
    #[config(default = "https")]
    pub scheme: String,
    /// Value from <https://github.com/Finb/Bark/tree/master/Sounds>
    #[config(default = "")]
    pub sound: String,
    /// The number displayed next to App icon
    #[config(default = "0")]
    pub badge: i64,
    /// An url to the icon, available only on iOS 15 or later
    #[config(default = "")]
    pub icon: String,
    /// The group of the notification
    #[config(default = "")]
    pub group: String,
    /// Url that will jump when click notification
    #[config(default = "")]
    pub url: String,
    /// Reserved field, no use yet
    #[config(default = "")]
    pub category: String,
    /// The value to be copied
    #[config(default = "")]
    pub copy: String,
}

impl BarkConfig {
    /// API endpoint URL, e.g. `https://api.day.app/push`.
    pub fn api_url(&self, endpoint: &str) -> Result<Url, ServiceError> {
        let mut path = String::from("/");
        path.push_str(self.path.trim_start_matches('/'));
        if !path.ends_with('/') {
            path.push('/');
        }
        path.push_str(endpoint);
        Ok(Url::parse(&format!("{}://{}{path}", self.scheme, self.host))?)
    }
}

#[derive(Serialize)]
struct PushPayload<'a> {
    body: &'a str,
    device_key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sound: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    badge: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    copy: Option<&'a str>,
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

/// Bark service.
pub struct BarkService {
    inner: Configured<BarkConfig>,
}

impl BarkService {
    /// Configure the service from its URL.
    pub fn from_url(url: &Url, logger: &Arc<dyn LoggerPort>) -> Result<Self, ServiceError> {
        Ok(Self {
            inner: Configured::from_url(url, logger)?,
        })
    }

    /// Parsed configuration.
    #[must_use]
    pub const fn config(&self) -> &BarkConfig {
        &self.inner.config
    }
}

impl NotificationService for BarkService {
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
        let payload = PushPayload {
            body: message,
            device_key: config.device_key.expose(),
            title: non_empty(&config.title),
            sound: non_empty(&config.sound),
            badge: (config.badge != 0).then_some(config.badge),
            icon: non_empty(&config.icon),
            group: non_empty(&config.group),
            url: non_empty(&config.url),
            category: non_empty(&config.category),
            copy: non_empty(&config.copy),
        };
        let request = PreparedRequest::new(HttpMethod::Post, &config.api_url("push")?).json(&payload)?;
        self.inner.prepared(vec![request])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::logger;
    use std::error::Error;

    fn service(url: &str) -> Result<BarkService, Box<dyn Error>> {
        let (_, logger) = logger();
        Ok(BarkService::from_url(&Url::parse(url)?, &logger)?)
    }

    #[test]
    fn parses_device_key_host_and_path() -> Result<(), Box<dyn Error>> {
        let service = service("bark://:devicekey@api.example.com:8080/bark?badge=3&title=Hi")?;
        let config = service.config();
        assert_eq!(config.device_key.expose(), "devicekey");
        assert_eq!(config.host, "api.example.com:8080");
        assert_eq!(config.path, "bark");
        assert_eq!(config.badge, 3);
        assert_eq!(config.scheme, "https");
        Ok(())
    }

    #[test]
    fn canonical_url_round_trips() -> Result<(), Box<dyn Error>> {
        let raw = "bark://:devicekey@api.example.com/bark?badge=3&sound=alarm";
        let service = service(raw)?;
        assert_eq!(service.config_url()?.as_str(), raw);
        Ok(())
    }

    #[test]
    fn missing_device_key_is_rejected() -> Result<(), Box<dyn Error>> {
        let (_, logger) = logger();
        let error = BarkService::from_url(&Url::parse("bark://api.example.com")?, &logger).err();
        assert_eq!(
            error,
            Some(ServiceError::Config(ConfigError::MissingField {
                field: "device_key"
            }))
        );
        Ok(())
    }

    #[test]
    fn api_url_normalizes_slashes() -> Result<(), Box<dyn Error>> {
        let mut config = BarkConfig {
            host: "api.day.app".to_string(),
            scheme: "https".to_string(),
            ..BarkConfig::default()
        };
        assert_eq!(config.api_url("push")?.as_str(), "https://api.day.app/push");
        config.path = "/custom/".to_string();
        assert_eq!(
            config.api_url("push")?.as_str(),
            "https://api.day.app/custom/push"
        );
        Ok(())
    }

    #[test]
    fn prepare_posts_json_with_overrides() -> Result<(), Box<dyn Error>> {
        let service = service("bark://:devicekey@api.day.app?title=Default")?;
        let params = Params::from([("title".to_string(), "Override".to_string())]);
        let requests = service.prepare("hello", &params)?;
        let request = requests.first().ok_or("no request")?;

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "https://api.day.app/push");
        let body: serde_json::Value = serde_json::from_str(request.body.as_deref().unwrap_or("{}"))?;
        assert_eq!(body["body"], "hello");
        assert_eq!(body["title"], "Override");
        assert_eq!(body["device_key"], "devicekey");
        assert!(body.get("badge").is_none());
        assert_eq!(service.config().title, "Default");
        Ok(())
    }
}
