//! Centralized configuration loading from rookery.toml.
//!
//! This crate provides the configuration structs and loading logic used by
//! the engine binary.
//!
//! # Configuration Priority
//!
//! Settings are loaded with the following priority (highest to lowest):
//! 1. Environment variables (`ROOKERY_<SECTION>_<KEY>`)
//! 2. rookery.toml file (or the file named by `ROOKERY_CONFIG`)
//! 3. Built-in defaults (`config.defaults.toml`, compiled in)
//!
//! Command-line flags of the binary sit above all of these.
//!
//! # Environment Variable Override Pattern
//!
//! ```text
//! ROOKERY_<SECTION>_<KEY>=value
//!
//! Examples:
//!     ROOKERY_COMMON_LOG_LEVEL=debug
//!     ROOKERY_COMMON_SEED=42
//!     ROOKERY_SEARCH_ITERATIONS=800
//!     ROOKERY_SEARCH_BACKPROP_WIN_LOSS=true
//!     ROOKERY_MODEL_PATH=/models/latest.onnx
//! ```

mod defaults;
mod loader;
mod structs;

pub use defaults::*;
pub use loader::{
    apply_env_overrides, load_config, load_from_path, CONFIG_ENV_VAR, CONFIG_SEARCH_PATHS,
};
pub use structs::*;

#[cfg(test)]
mod tests;
