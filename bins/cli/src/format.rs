//! Output format helpers for CLI commands.

use clap::{Args, ValueEnum};

/// Output format choices for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-friendly text output.
    Text,
    /// Machine-friendly JSON output.
    Json,
}

/// Log line format on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// `tracing` formatted lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// Output-related CLI flags.
#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Output format for command responses.
    #[arg(long, global = true, value_enum)]
    pub output: Option<OutputFormat>,
    /// Log format for diagnostics on stderr.
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,
    /// Emit debug logs.
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Output mode derived from CLI flags.
#[derive(Debug, Clone, Copy)]
pub struct OutputMode {
    pub format: OutputFormat,
    pub log_format: LogFormat,
    pub verbose: bool,
}

impl OutputMode {
    /// Build output mode from CLI flags.
    #[must_use]
    pub fn from_args(args: &OutputArgs) -> Self {
        Self {
            format: args.output.unwrap_or(OutputFormat::Text),
            log_format: args.log_format.unwrap_or(LogFormat::Text),
            verbose: args.verbose,
        }
    }

    /// Returns true when JSON output is requested.
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }
}
