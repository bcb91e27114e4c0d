//! Configuration for the engine binary
//!
//! Defaults come from rookery.toml (with `ROOKERY_<SECTION>_<KEY>` environment
//! overrides, see `engine-config`). CLI arguments take highest priority, and
//! `--search-args` refines the `[search]` section with the compact
//! `key=value` option list.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use engine_config::{load_config, CentralConfig, SearchSection};
use mcts::SearchConfig;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

// Load central config once at startup
static CENTRAL_CONFIG: Lazy<CentralConfig> = Lazy::new(load_config);

fn default_log_level() -> String {
    CENTRAL_CONFIG.common.log_level.clone()
}

fn default_seed() -> u64 {
    CENTRAL_CONFIG.common.seed
}

fn default_model() -> String {
    CENTRAL_CONFIG.model.path.clone()
}

fn default_intra_threads() -> usize {
    CENTRAL_CONFIG.model.intra_threads
}

fn default_policy_logits() -> bool {
    CENTRAL_CONFIG.model.policy_logits
}

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(name = "rookery-uci")]
#[command(about = "rookery - MCTS chess engine speaking the UCI line protocol")]
#[command(
    long_about = "Chess engine that answers UCI commands on stdin/stdout. Logs go to stderr.

Configuration is loaded from rookery.toml with environment variable overrides.
CLI arguments take highest priority."
)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error); RUST_LOG wins if set
    #[arg(long, default_value_t = default_log_level())]
    pub log_level: String,

    /// RNG seed for the session (0 = from OS entropy)
    #[arg(long, default_value_t = default_seed())]
    pub seed: u64,

    /// Path to an ONNX model (empty = uniform evaluator)
    #[arg(long, default_value_t = default_model())]
    pub model: String,

    /// ONNX Runtime intra-op threads
    #[arg(long, default_value_t = default_intra_threads())]
    pub intra_threads: usize,

    /// Softmax the model's policy output (set for models emitting logits)
    #[arg(long, default_value_t = default_policy_logits(), action = clap::ArgAction::Set)]
    pub policy_logits: bool,

    /// Search options as a comma-separated key=value list,
    /// e.g. "iter=400,temp=0.2,bpwl=1"
    #[arg(long, default_value = "")]
    pub search_args: String,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(anyhow!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            ));
        }

        if self.intra_threads == 0 {
            return Err(anyhow!("intra_threads must be greater than 0"));
        }

        SearchConfig::from_args(&self.search_args)
            .with_context(|| format!("invalid --search-args '{}'", self.search_args))?;

        Ok(())
    }

    /// Model path, if one is configured.
    pub fn model_path(&self) -> Option<&str> {
        let path = self.model.trim();
        if path.is_empty() {
            None
        } else {
            Some(path)
        }
    }

    /// Search configuration: file and environment settings, then the CLI seed
    /// and `--search-args`.
    pub fn search_config(&self) -> Result<SearchConfig> {
        self.search_config_from(&CENTRAL_CONFIG.search)
    }

    fn search_config_from(&self, section: &SearchSection) -> Result<SearchConfig> {
        let mut config = search_config_from_section(section);
        config.seed = (self.seed != 0).then_some(self.seed);
        config
            .apply_args(&self.search_args)
            .with_context(|| format!("invalid --search-args '{}'", self.search_args))?;
        Ok(config)
    }
}

/// Map the `[search]` section onto the typed search configuration.
pub fn search_config_from_section(section: &SearchSection) -> SearchConfig {
    SearchConfig {
        iterations: section.iterations,
        exploration: section.exploration,
        temperature: section.temperature,
        ramp: section.ramp,
        priority_uniform: section.priority_uniform,
        priority_exponent: section.priority_exponent,
        value_in_log_odds: section.value_in_log_odds,
        parent_prior_odds_mult: section.parent_prior_odds_mult,
        parent_prior_value_diff: section.parent_prior_value_diff,
        backprop_win_loss: section.backprop_win_loss,
        policy_add_value_and_prior: section.policy_add_value_and_prior,
        take_or_avoid_knowns: section.take_or_avoid_knowns,
        value_quantile: section.value_quantile,
        claim_draw_halfmove: section.claim_draw_halfmove,
        claim_draw_prior: section.claim_draw_prior,
        unvisited_noise: section.unvisited_noise,
        draw_choice_correction: section.draw_choice_correction,
        seed: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            log_level: "info".into(),
            seed: 0,
            model: String::new(),
            intra_threads: 1,
            policy_logits: false,
            search_args: String::new(),
        }
    }

    #[test]
    fn validate_accepts_valid_configuration() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut cfg = base_config();
        cfg.log_level = "loud".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("invalid log level"));
    }

    #[test]
    fn validate_rejects_zero_intra_threads() {
        let mut cfg = base_config();
        cfg.intra_threads = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("intra_threads"));
    }

    #[test]
    fn validate_rejects_bad_search_args() {
        let mut cfg = base_config();
        cfg.search_args = "iter=lots".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("--search-args"));
    }

    #[test]
    fn model_path_blank_means_none() {
        let mut cfg = base_config();
        assert_eq!(cfg.model_path(), None);
        cfg.model = "  ".into();
        assert_eq!(cfg.model_path(), None);
        cfg.model = "models/latest.onnx".into();
        assert_eq!(cfg.model_path(), Some("models/latest.onnx"));
    }

    #[test]
    fn section_maps_every_field() {
        let section = SearchSection {
            iterations: 123,
            backprop_win_loss: true,
            value_quantile: 0.25,
            claim_draw_halfmove: 0,
            ..SearchSection::default()
        };
        let config = search_config_from_section(&section);
        assert_eq!(config.iterations, 123);
        assert!(config.backprop_win_loss);
        assert!((config.value_quantile - 0.25).abs() < 1e-12);
        assert_eq!(config.claim_draw_halfmove, 0);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn search_args_override_section() {
        let mut cfg = base_config();
        cfg.seed = 9;
        cfg.search_args = "iter=50,temp=0.5,toak=1".into();

        let config = cfg.search_config_from(&SearchSection::default()).unwrap();
        assert_eq!(config.iterations, 50);
        assert!((config.temperature - 0.5).abs() < 1e-12);
        assert!(config.take_or_avoid_knowns);
        assert_eq!(config.seed, Some(9));
    }

    #[test]
    fn search_args_seed_beats_cli_seed() {
        let mut cfg = base_config();
        cfg.seed = 9;
        cfg.search_args = "seed=4".into();
        let config = cfg.search_config_from(&SearchSection::default()).unwrap();
        assert_eq!(config.seed, Some(4));
    }
}
