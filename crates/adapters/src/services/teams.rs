//! Microsoft Teams incoming webhooks
//! (`teams://group@tenant/altId/groupOwner/extraId?host=...`).

use super::Configured;
use notify_url_format::{ConfigRecord, Params, UrlContext};
use notify_url_ports::{
    ConfigError, HttpMethod, LoggerPort, NotificationService, PreparedRequest, ServiceError,
};
use serde::Serialize;
use std::sync::Arc;
use url::Url;

/// URL scheme of the service.
pub const SCHEME: &str = "teams";

const WEBHOOK_PREFIX: &str = "webhookb2";
const PROVIDER: &str = "IncomingWebhook";

/// Teams configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, ConfigRecord)]
#[config(scheme = "teams", validate = "validate_teams")]
pub struct TeamsConfig {
    /// Group ID of the webhook
    #[config(url = "user")]
    pub group: String,
    /// Tenant ID of the webhook
    #[config(url = "host")]
    pub tenant: String,
    /// Remaining webhook IDs as `altId/groupOwner/extraId`
    #[config(url = "path")]
    pub webhook_path: String,
    /// Webhook host, e.g. `outlook.webhook.office.com`
    #[config(key = "host")]
    pub webhook_host: String,
    /// Message title
    #[config(default = "")]
    pub title: String,
    /// Message accent color
    #[config(default = "")]
    pub color: String,
}

impl TeamsConfig {
    /// `(altId, groupOwner, extraId)` when the path holds exactly three
    /// non-empty segments.
    #[must_use]
    pub fn path_parts(&self) -> Option<(&str, &str, &str)> {
        let mut segments = self.webhook_path.split('/');
        match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(alt_id), Some(group_owner), Some(extra_id), None)
                if !alt_id.is_empty() && !group_owner.is_empty() && !extra_id.is_empty() =>
            {
                Some((alt_id, group_owner, extra_id))
            },
            _ => None,
        }
    }

    /// Webhook endpoint the message is posted to.
    pub fn webhook_url(&self) -> Result<Url, ServiceError> {
        let (alt_id, group_owner, extra_id) = self
            .path_parts()
            .ok_or(ConfigError::MissingField { field: "webhook_path" })?;
        Ok(Url::parse(&format!(
            "https://{}/{WEBHOOK_PREFIX}/{}@{}/{PROVIDER}/{alt_id}/{group_owner}/{extra_id}",
            self.webhook_host, self.group, self.tenant
        ))?)
    }
}

fn validate_teams(config: &TeamsConfig, _context: &UrlContext<'_>) -> Result<(), ConfigError> {
    let Some((alt_id, group_owner, _)) = config.path_parts() else {
        return Err(ConfigError::validation(
            "webhook_path",
            "expected altId/groupOwner/extraId",
        ));
    };
    if !is_uuid(&config.group) {
        return Err(ConfigError::validation("group", "group ID is not a UUID"));
    }
    if !is_uuid(&config.tenant) {
        return Err(ConfigError::validation("tenant", "tenant ID is not a UUID"));
    }
    if !is_hex(alt_id, 32) {
        return Err(ConfigError::validation("webhook_path", "altId is not 32 hex digits"));
    }
    if !is_uuid(group_owner) {
        return Err(ConfigError::validation("webhook_path", "group owner is not a UUID"));
    }
    Ok(())
}

fn is_hex(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|byte| byte.is_ascii_hexdigit())
}

fn is_uuid(value: &str) -> bool {
    let groups: Vec<&str> = value.split('-').collect();
    groups.len() == 5
        && groups
            .iter()
            .zip([8, 4, 4, 4, 12])
            .all(|(group, len)| is_hex(group, len))
}

#[derive(Serialize)]
struct MessageCard<'a> {
    #[serde(rename = "@type")]
    card_type: &'static str,
    #[serde(rename = "@context")]
    context: &'static str,
    markdown: bool,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    summary: &'a str,
    #[serde(rename = "themeColor", skip_serializing_if = "Option::is_none")]
    theme_color: Option<&'a str>,
}

/// Teams service.
pub struct TeamsService {
    inner: Configured<TeamsConfig>,
}

impl TeamsService {
    /// Configure the service from its URL.
    pub fn from_url(url: &Url, logger: &Arc<dyn LoggerPort>) -> Result<Self, ServiceError> {
        Ok(Self {
            inner: Configured::from_url(url, logger)?,
        })
    }

    /// Parsed configuration.
    #[must_use]
    pub const fn config(&self) -> &TeamsConfig {
        &self.inner.config
    }
}

impl NotificationService for TeamsService {
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
        let title = (!config.title.is_empty()).then_some(config.title.as_str());
        let card = MessageCard {
            card_type: "MessageCard",
            context: "http://schema.org/extensions",
            markdown: true,
            text: message,
            title,
            summary: title.unwrap_or(message),
            theme_color: (!config.color.is_empty()).then_some(config.color.as_str()),
        };
        let request = PreparedRequest::new(HttpMethod::Post, &config.webhook_url()?).json(&card)?;
        self.inner.prepared(vec![request])
    }
}
