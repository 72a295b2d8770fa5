//! Connection settings module.
//!
//! Manages the TOML config file holding the server URL, secret, and
//! timeout, and merges it with command-line flags and environment
//! variables.

#[allow(clippy::module_inception)]
mod config;
mod paths;

#[allow(clippy::module_name_repetitions)]
pub use config::{AppConfig, ConnectionOverrides, ConnectionSettings};
pub use paths::resolve_config_path;
