//! # notify-url-ports
//!
//! Port traits for URL-configured notification services.
//!
//! This crate defines the interfaces between the service adapters and their
//! callers. It depends only on `format` and `shared`.

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod logger;
pub mod service;

pub use logger::*;
pub use service::*;

// Re-exported so adapter crates can implement ports without depending on
// `notify-url-format` for signature types alone.
pub use notify_url_format::{ConfigError, Params};

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                in_deps = line == "[dependencies]" || line == "[dev-dependencies]";
                continue;
            }
            if in_deps && line.starts_with("notify-url-") {
                let key = line.split('=').next().unwrap_or("").trim();
                deps.push(key.split('.').next().unwrap_or("").trim().to_string());
            }
        }

        deps
    }

    #[test]
    fn ports_depends_only_on_format_and_shared() {
        let deps = workspace_deps();
        let allowed = ["notify-url-format", "notify-url-shared"];

        for dep in &deps {
            assert!(
                allowed.contains(&dep.as_str()),
                "unexpected dependency found: {dep}"
            );
        }
        for expected in allowed {
            assert!(
                deps.iter().any(|dep| dep == expected),
                "missing dependency: {expected}"
            );
        }
    }

    #[test]
    fn ports_crate_compiles() {
        assert!(!ports_crate_version().is_empty());
    }
}
