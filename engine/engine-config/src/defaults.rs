//! Default configuration values loaded from config.defaults.toml.
//!
//! This module loads defaults from the shared TOML file at compile time,
//! so the documented defaults and the binary can never drift apart.

use once_cell::sync::Lazy;
use serde::Deserialize;

/// The embedded defaults TOML file (loaded at compile time)
const DEFAULTS_TOML: &str = include_str!("../../../config.defaults.toml");

/// Parsed defaults structure (parsed once at first use)
static DEFAULTS: Lazy<DefaultsConfig> = Lazy::new(|| {
    toml::from_str(DEFAULTS_TOML).expect("config.defaults.toml should be valid TOML")
});

// ============================================================================
// Internal structs for parsing config.defaults.toml
// ============================================================================

#[derive(Debug, Deserialize)]
struct DefaultsConfig {
    common: CommonDefaults,
    search: SearchDefaults,
    model: ModelDefaults,
}

#[derive(Debug, Deserialize)]
struct CommonDefaults {
    log_level: String,
    seed: u64,
}

#[derive(Debug, Deserialize)]
struct SearchDefaults {
    iterations: u32,
    exploration: f64,
    temperature: f64,
    ramp: u32,
    priority_uniform: f64,
    priority_exponent: f64,
    value_in_log_odds: f64,
    parent_prior_odds_mult: f64,
    parent_prior_value_diff: f64,
    backprop_win_loss: bool,
    policy_add_value_and_prior: bool,
    take_or_avoid_knowns: bool,
    value_quantile: f64,
    claim_draw_halfmove: u32,
    claim_draw_prior: f64,
    unvisited_noise: f64,
    draw_choice_correction: bool,
}

#[derive(Debug, Deserialize)]
struct ModelDefaults {
    path: String,
    intra_threads: usize,
    policy_logits: bool,
}

// ============================================================================
// Public accessor functions
// ============================================================================

// Common
pub fn log_level() -> &'static str {
    &DEFAULTS.common.log_level
}
pub fn seed() -> u64 {
    DEFAULTS.common.seed
}

// Search
pub fn iterations() -> u32 {
    DEFAULTS.search.iterations
}
pub fn exploration() -> f64 {
    DEFAULTS.search.exploration
}
pub fn temperature() -> f64 {
    DEFAULTS.search.temperature
}
pub fn ramp() -> u32 {
    DEFAULTS.search.ramp
}
pub fn priority_uniform() -> f64 {
    DEFAULTS.search.priority_uniform
}
pub fn priority_exponent() -> f64 {
    DEFAULTS.search.priority_exponent
}
pub fn value_in_log_odds() -> f64 {
    DEFAULTS.search.value_in_log_odds
}
pub fn parent_prior_odds_mult() -> f64 {
    DEFAULTS.search.parent_prior_odds_mult
}
pub fn parent_prior_value_diff() -> f64 {
    DEFAULTS.search.parent_prior_value_diff
}
pub fn backprop_win_loss() -> bool {
    DEFAULTS.search.backprop_win_loss
}
pub fn policy_add_value_and_prior() -> bool {
    DEFAULTS.search.policy_add_value_and_prior
}
pub fn take_or_avoid_knowns() -> bool {
    DEFAULTS.search.take_or_avoid_knowns
}
pub fn value_quantile() -> f64 {
    DEFAULTS.search.value_quantile
}
pub fn claim_draw_halfmove() -> u32 {
    DEFAULTS.search.claim_draw_halfmove
}
pub fn claim_draw_prior() -> f64 {
    DEFAULTS.search.claim_draw_prior
}
pub fn unvisited_noise() -> f64 {
    DEFAULTS.search.unvisited_noise
}
pub fn draw_choice_correction() -> bool {
    DEFAULTS.search.draw_choice_correction
}

// Model
pub fn model_path() -> &'static str {
    &DEFAULTS.model.path
}
pub fn intra_threads() -> usize {
    DEFAULTS.model.intra_threads
}
pub fn policy_logits() -> bool {
    DEFAULTS.model.policy_logits
}
