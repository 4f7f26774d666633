//! CLI binary entrypoint.

mod commands;
mod error;
mod format;

use clap::{Parser, Subcommand};
use commands::{parse_params, run_docs, run_prepare, run_services, run_verify};
use error::{CliError, ExitCode};
use format::{LogFormat, OutputArgs, OutputMode};
use notify_url_adapters::{JsonLogger, ServiceRouter, StderrLogSink, TracingLogger};
use notify_url_ports::{LogLevel, LoggerPort};
use notify_url_shared::ErrorEnvelope;
use serde::Serialize;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Parser)]
#[command(
    name = "notify-url",
    version,
    about = "Inspect URL-configured notification services",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Parse a service URL and print its canonical form.
    Verify {
        /// Service configuration URL.
        url: String,
    },
    /// Show the configuration fields of a service.
    Docs {
        /// URL scheme of the service (e.g. `ntfy`).
        scheme: String,
    },
    /// Build the requests a message would produce, without sending them.
    Prepare {
        /// Service configuration URL.
        url: String,
        /// Message text.
        #[arg(long, short)]
        message: String,
        /// Per-message override, repeatable.
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
    /// List supported URL schemes.
    Services,
}

pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: ExitCode,
}

impl CliOutput {
    pub(crate) const fn ok(stdout: String) -> Self {
        Self {
            stdout,
            stderr: String::new(),
            exit_code: ExitCode::Ok,
        }
    }
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let mode = OutputMode::from_args(&cli.output);
    let router = ServiceRouter::new(init_logging(mode));

    match run(&cli.command, mode, &router) {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

/// Install the log pipeline and return the logger handed to services.
fn init_logging(mode: OutputMode) -> Arc<dyn LoggerPort> {
    match mode.log_format {
        LogFormat::Json => {
            let level = if mode.verbose {
                LogLevel::Debug
            } else {
                LogLevel::Warn
            };
            Arc::new(JsonLogger::new(Arc::new(StderrLogSink)).with_min_level(level))
        },
        LogFormat::Text => {
            let level = if mode.verbose {
                tracing::Level::DEBUG
            } else {
                tracing::Level::WARN
            };
            let initialized = tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(EnvFilter::from_default_env().add_directive(level.into()))
                .try_init();
            if let Err(error) = initialized {
                let _ = writeln!(io::stderr(), "log setup failed: {error}");
            }
            Arc::new(TracingLogger::new())
        },
    }
}

fn run(command: &Commands, mode: OutputMode, router: &ServiceRouter) -> Result<CliOutput, CliError> {
    let result = match command {
        Commands::Verify { url } => run_verify(mode, router, url),
        Commands::Docs { scheme } => run_docs(mode, scheme),
        Commands::Prepare {
            url,
            message,
            params,
        } => run_prepare(mode, router, url, message, &parse_params(params)?),
        Commands::Services => run_services(mode),
    };
    match result {
        Err(error) if error.is_reportable() => Ok(format_error(mode, error)),
        other => other,
    }
}

pub(crate) fn to_json_output<T: Serialize>(payload: &T) -> Result<String, CliError> {
    let mut output = serde_json::to_string_pretty(payload)?;
    output.push('\n');
    Ok(output)
}

fn format_error(mode: OutputMode, error: CliError) -> CliOutput {
    let exit_code = error.exit_code();
    let envelope = ErrorEnvelope::from(error);

    let stdout = if mode.is_json() {
        let payload = serde_json::json!({
            "status": "error",
            "error": envelope,
        });

        to_json_output(&payload).unwrap_or_else(|_| {
            "{\"status\":\"error\",\"error\":{\"code\":\"core:internal\",\"message\":\"internal error\"}}\n".to_string()
        })
    } else {
        format_error_text(&envelope)
    };

    CliOutput {
        stdout,
        stderr: String::new(),
        exit_code,
    }
}

fn format_error_text(envelope: &ErrorEnvelope) -> String {
    let mut out = format!(
        "status: error\ncode: {}\nmessage: {}\n",
        envelope.code, envelope.message
    );
    for (key, value) in &envelope.metadata {
        let _ = writeln!(out, "{key}: {value}");
    }
    out
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;

    if !output.stderr.is_empty() {
        let mut stderr = io::stderr();
        stderr.write_all(output.stderr.as_bytes())?;
        stderr.flush()?;
    }

    Ok(())
}
