//! Configuration loading logic.
//!
//! Handles loading config from files and applying environment variable overrides.

use crate::CentralConfig;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "ROOKERY_CONFIG";

/// Standard locations to search for rookery.toml
pub const CONFIG_SEARCH_PATHS: &[&str] = &[
    "rookery.toml",    // Current directory
    "../rookery.toml", // Parent directory (when running from subdirectory)
];

/// Load the engine configuration.
///
/// Searches in the following order:
/// 1. Path specified by the ROOKERY_CONFIG environment variable
/// 2. Current directory (rookery.toml)
/// 3. Parent directory (../rookery.toml)
///
/// After loading, environment variable overrides are applied.
pub fn load_config() -> CentralConfig {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(&path);
        if path.exists() {
            info!("Loading config from {}: {}", CONFIG_ENV_VAR, path.display());
            return load_from_path(&path);
        }
        warn!(
            "{}={} not found, searching defaults",
            CONFIG_ENV_VAR,
            path.display()
        );
    }

    for path_str in CONFIG_SEARCH_PATHS {
        let path = PathBuf::from(path_str);
        if path.exists() {
            info!("Loading config from {}", path.display());
            return load_from_path(&path);
        }
    }

    debug!("No rookery.toml found, using built-in defaults");
    apply_env_overrides(CentralConfig::default())
}

/// Load configuration from a specific path.
///
/// A missing or malformed file is not fatal: the built-in defaults are used
/// and a warning is logged.
pub fn load_from_path(path: &Path) -> CentralConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => apply_env_overrides(config),
            Err(e) => {
                warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                apply_env_overrides(CentralConfig::default())
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {}, using defaults", path.display(), e);
            apply_env_overrides(CentralConfig::default())
        }
    }
}

macro_rules! env_override {
    // String field
    ($config:expr, $section:ident . $field:ident, $key:expr) => {
        if let Ok(v) = std::env::var($key) {
            $config.$section.$field = v;
        }
    };
    // Parseable field (u32, f64, bool, etc.)
    ($config:expr, $section:ident . $field:ident, $key:expr, parse) => {
        match std::env::var($key).map(|s| s.trim().parse()) {
            Ok(Ok(v)) => $config.$section.$field = v,
            Ok(Err(_)) => warn!("Ignoring unparseable value for {}", $key),
            Err(_) => {}
        }
    };
}

/// Apply environment variable overrides to a configuration.
///
/// Environment variables follow the pattern: ROOKERY_<SECTION>_<KEY>
pub fn apply_env_overrides(mut config: CentralConfig) -> CentralConfig {
    // Common
    env_override!(config, common.log_level, "ROOKERY_COMMON_LOG_LEVEL");
    env_override!(config, common.seed, "ROOKERY_COMMON_SEED", parse);

    // Search
    env_override!(
        config,
        search.iterations,
        "ROOKERY_SEARCH_ITERATIONS",
        parse
    );
    env_override!(
        config,
        search.exploration,
        "ROOKERY_SEARCH_EXPLORATION",
        parse
    );
    env_override!(
        config,
        search.temperature,
        "ROOKERY_SEARCH_TEMPERATURE",
        parse
    );
    env_override!(config, search.ramp, "ROOKERY_SEARCH_RAMP", parse);
    env_override!(
        config,
        search.priority_uniform,
        "ROOKERY_SEARCH_PRIORITY_UNIFORM",
        parse
    );
    env_override!(
        config,
        search.priority_exponent,
        "ROOKERY_SEARCH_PRIORITY_EXPONENT",
        parse
    );
    env_override!(
        config,
        search.value_in_log_odds,
        "ROOKERY_SEARCH_VALUE_IN_LOG_ODDS",
        parse
    );
    env_override!(
        config,
        search.parent_prior_odds_mult,
        "ROOKERY_SEARCH_PARENT_PRIOR_ODDS_MULT",
        parse
    );
    env_override!(
        config,
        search.parent_prior_value_diff,
        "ROOKERY_SEARCH_PARENT_PRIOR_VALUE_DIFF",
        parse
    );
    env_override!(
        config,
        search.backprop_win_loss,
        "ROOKERY_SEARCH_BACKPROP_WIN_LOSS",
        parse
    );
    env_override!(
        config,
        search.policy_add_value_and_prior,
        "ROOKERY_SEARCH_POLICY_ADD_VALUE_AND_PRIOR",
        parse
    );
    env_override!(
        config,
        search.take_or_avoid_knowns,
        "ROOKERY_SEARCH_TAKE_OR_AVOID_KNOWNS",
        parse
    );
    env_override!(
        config,
        search.value_quantile,
        "ROOKERY_SEARCH_VALUE_QUANTILE",
        parse
    );
    env_override!(
        config,
        search.claim_draw_halfmove,
        "ROOKERY_SEARCH_CLAIM_DRAW_HALFMOVE",
        parse
    );
    env_override!(
        config,
        search.claim_draw_prior,
        "ROOKERY_SEARCH_CLAIM_DRAW_PRIOR",
        parse
    );
    env_override!(
        config,
        search.unvisited_noise,
        "ROOKERY_SEARCH_UNVISITED_NOISE",
        parse
    );
    env_override!(
        config,
        search.draw_choice_correction,
        "ROOKERY_SEARCH_DRAW_CHOICE_CORRECTION",
        parse
    );

    // Model
    env_override!(config, model.path, "ROOKERY_MODEL_PATH");
    env_override!(
        config,
        model.intra_threads,
        "ROOKERY_MODEL_INTRA_THREADS",
        parse
    );
    env_override!(
        config,
        model.policy_logits,
        "ROOKERY_MODEL_POLICY_LOGITS",
        parse
    );

    config
}
