//! Services command handler.

use crate::error::CliError;
use crate::format::OutputMode;
use crate::{CliOutput, to_json_output};
use notify_url_adapters::ServiceRouter;

/// List the supported URL schemes.
pub fn run_services(mode: OutputMode) -> Result<CliOutput, CliError> {
    let schemes = ServiceRouter::schemes();
    let stdout = if mode.is_json() {
        to_json_output(&serde_json::json!({ "status": "ok", "services": schemes }))?
    } else {
        let mut out = String::new();
        for scheme in schemes {
            out.push_str(scheme);
            out.push('\n');
        }
        out
    };
    Ok(CliOutput::ok(stdout))
}
