//! Verify command handler.

use crate::error::CliError;
use crate::format::OutputMode;
use crate::{CliOutput, to_json_output};
use notify_url_adapters::ServiceRouter;
use notify_url_format::redact_url;
use notify_url_ports::ServiceError;

/// Parse a service URL and print its canonical, redacted form.
pub fn run_verify(
    mode: OutputMode,
    router: &ServiceRouter,
    raw_url: &str,
) -> Result<CliOutput, CliError> {
    let service = router.locate_str(raw_url)?;
    let canonical = redact_url(&service.config_url().map_err(ServiceError::from)?);

    let stdout = if mode.is_json() {
        to_json_output(&serde_json::json!({
            "status": "ok",
            "service": service.id(),
            "url": canonical,
        }))?
    } else {
        format!("status: ok\nservice: {}\nurl: {canonical}\n", service.id())
    };
    Ok(CliOutput::ok(stdout))
}
