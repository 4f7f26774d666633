//! Prepare command handler (dry run).

use crate::error::CliError;
use crate::format::OutputMode;
use crate::{CliOutput, to_json_output};
use notify_url_adapters::ServiceRouter;
use notify_url_ports::{Params, PreparedRequest};
use std::fmt::Write as _;

/// Parse repeated `key=value` flags into per-message params.
pub fn parse_params(raw: &[String]) -> Result<Params, CliError> {
    let mut params = Params::new();
    for entry in raw {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| CliError::InvalidInput(format!("expected key=value, got {entry:?}")))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(CliError::InvalidInput(format!(
                "parameter key is empty in {entry:?}"
            )));
        }
        params.insert(key.to_string(), value.to_string());
    }
    Ok(params)
}

/// Build the requests for one message without sending them.
pub fn run_prepare(
    mode: OutputMode,
    router: &ServiceRouter,
    raw_url: &str,
    message: &str,
    params: &Params,
) -> Result<CliOutput, CliError> {
    let located = router.locate_str(raw_url)?;
    let service = located.id();
    let requests: Vec<PreparedRequest> = located
        .prepare(message, params)?
        .iter()
        .map(PreparedRequest::redacted)
        .collect();

    let stdout = if mode.is_json() {
        to_json_output(&serde_json::json!({
            "status": "ok",
            "service": service,
            "requests": requests,
        }))?
    } else {
        format_requests_text(service, &requests)
    };
    Ok(CliOutput::ok(stdout))
}

fn format_requests_text(service: &str, requests: &[PreparedRequest]) -> String {
    let mut out = format!("status: ok\nservice: {service}\n");
    for (index, request) in requests.iter().enumerate() {
        let _ = writeln!(
            out,
            "request {}: {} {}",
            index + 1,
            request.method.as_str(),
            request.url
        );
        for (name, value) in &request.headers {
            let _ = writeln!(out, "  {name}: {value}");
        }
        if let Some(body) = &request.body {
            let _ = writeln!(out, "  body: {body}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_split_on_the_first_equals_sign() -> Result<(), CliError> {
        let params = parse_params(&["title=a=b".to_string(), " priority =high".to_string()])?;
        assert_eq!(params.get("title").map(String::as_str), Some("a=b"));
        assert_eq!(params.get("priority").map(String::as_str), Some("high"));
        Ok(())
    }

    #[test]
    fn malformed_params_are_invalid_input() {
        for raw in ["title", "=value"] {
            let error = parse_params(&[raw.to_string()]).err();
            assert!(matches!(error, Some(CliError::InvalidInput(_))), "{raw}");
        }
    }
}
