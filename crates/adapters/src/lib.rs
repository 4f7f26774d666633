//! # notify-url-adapters
//!
//! Adapter implementations for ports: notification services configured from
//! URLs, the scheme router, and logger adapters.
//! This crate depends on `format`, `ports`, and `shared`.

pub mod log_sink;
pub mod logger;
pub mod router;
pub mod services;
pub mod tracing_logger;

pub use log_sink::{LogSink, MemoryLogSink, StderrLogSink};
pub use logger::JsonLogger;
pub use router::ServiceRouter;
pub use tracing_logger::TracingLogger;

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify_url_ports::ports_crate_version;
    use notify_url_shared::shared_crate_version;

    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;
        let mut in_dev_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                in_deps = line == "[dependencies]";
                in_dev_deps = line == "[dev-dependencies]";
                continue;
            }
            if !(in_deps || in_dev_deps) {
                continue;
            }
            if line.starts_with("notify-url-") {
                let key = line.split('=').next().unwrap_or("").trim();
                let name = key.split('.').next().unwrap_or("").trim();
                deps.push(name.to_string());
            }
        }

        deps
    }

    #[test]
    fn adapters_do_not_depend_on_the_cli() {
        let deps = workspace_deps();
        let forbidden = ["notify-url-cli"];

        for dep in &deps {
            assert!(
                !forbidden.contains(&dep.as_str()),
                "forbidden dependency found: {dep}"
            );
        }
    }

    #[test]
    fn adapters_crate_compiles() {
        assert!(!adapters_crate_version().is_empty());
    }

    #[test]
    fn adapters_can_use_ports_and_shared() {
        assert!(!ports_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }
}
