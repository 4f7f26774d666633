//! CLI command handlers.

pub mod docs;
pub mod prepare;
pub mod services;
pub mod verify;

pub use docs::run_docs;
pub use prepare::{parse_params, run_prepare};
pub use services::run_services;
pub use verify::run_verify;
