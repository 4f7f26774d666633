//! Docs command handler.

use crate::error::CliError;
use crate::format::OutputMode;
use crate::{CliOutput, to_json_output};
use notify_url_adapters::ServiceRouter;

/// Print the configuration fields of the service registered for `scheme`.
pub fn run_docs(mode: OutputMode, scheme: &str) -> Result<CliOutput, CliError> {
    let docs = ServiceRouter::docs(scheme)?;
    let stdout = if mode.is_json() {
        to_json_output(&docs)?
    } else {
        docs.render_text()
    };
    Ok(CliOutput::ok(stdout))
}
