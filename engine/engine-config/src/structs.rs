//! Configuration struct definitions.
//!
//! All config structs with serde deserialization support and default values.

use crate::defaults;
use serde::Deserialize;

// ============================================================================
// Serde default functions (required for #[serde(default = "...")])
// These call the accessor functions from defaults module
// ============================================================================

fn d_log_level() -> String {
    defaults::log_level().into()
}
fn d_seed() -> u64 {
    defaults::seed()
}
fn d_iterations() -> u32 {
    defaults::iterations()
}
fn d_exploration() -> f64 {
    defaults::exploration()
}
fn d_temperature() -> f64 {
    defaults::temperature()
}
fn d_ramp() -> u32 {
    defaults::ramp()
}
fn d_priority_uniform() -> f64 {
    defaults::priority_uniform()
}
fn d_priority_exponent() -> f64 {
    defaults::priority_exponent()
}
fn d_value_in_log_odds() -> f64 {
    defaults::value_in_log_odds()
}
fn d_parent_prior_odds_mult() -> f64 {
    defaults::parent_prior_odds_mult()
}
fn d_parent_prior_value_diff() -> f64 {
    defaults::parent_prior_value_diff()
}
fn d_backprop_win_loss() -> bool {
    defaults::backprop_win_loss()
}
fn d_policy_add_value_and_prior() -> bool {
    defaults::policy_add_value_and_prior()
}
fn d_take_or_avoid_knowns() -> bool {
    defaults::take_or_avoid_knowns()
}
fn d_value_quantile() -> f64 {
    defaults::value_quantile()
}
fn d_claim_draw_halfmove() -> u32 {
    defaults::claim_draw_halfmove()
}
fn d_claim_draw_prior() -> f64 {
    defaults::claim_draw_prior()
}
fn d_unvisited_noise() -> f64 {
    defaults::unvisited_noise()
}
fn d_draw_choice_correction() -> bool {
    defaults::draw_choice_correction()
}
fn d_model_path() -> String {
    defaults::model_path().into()
}
fn d_intra_threads() -> usize {
    defaults::intra_threads()
}
fn d_policy_logits() -> bool {
    defaults::policy_logits()
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Root configuration structure matching rookery.toml
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CentralConfig {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub model: ModelConfig,
}

/// Settings shared by every component
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommonConfig {
    #[serde(default = "d_log_level")]
    pub log_level: String,
    /// RNG seed for engine sessions; 0 seeds from OS entropy.
    #[serde(default = "d_seed")]
    pub seed: u64,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::log_level().into(),
            seed: defaults::seed(),
        }
    }
}

/// Search parameters. Field names are the long forms of the compact
/// `key=value` option names accepted on the command line.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchSection {
    /// `iter`: simulations per decision
    #[serde(default = "d_iterations")]
    pub iterations: u32,
    /// `expl`
    #[serde(default = "d_exploration")]
    pub exploration: f64,
    /// `temp`
    #[serde(default = "d_temperature")]
    pub temperature: f64,
    /// `ramp`: plies until the temperature settles
    #[serde(default = "d_ramp")]
    pub ramp: u32,
    /// `unif`
    #[serde(default = "d_priority_uniform")]
    pub priority_uniform: f64,
    /// `pexp`
    #[serde(default = "d_priority_exponent")]
    pub priority_exponent: f64,
    /// `vilo`
    #[serde(default = "d_value_in_log_odds")]
    pub value_in_log_odds: f64,
    /// `ppom`
    #[serde(default = "d_parent_prior_odds_mult")]
    pub parent_prior_odds_mult: f64,
    /// `ppvd`
    #[serde(default = "d_parent_prior_value_diff")]
    pub parent_prior_value_diff: f64,
    /// `bpwl`
    #[serde(default = "d_backprop_win_loss")]
    pub backprop_win_loss: bool,
    /// `pavp`
    #[serde(default = "d_policy_add_value_and_prior")]
    pub policy_add_value_and_prior: bool,
    /// `toak`
    #[serde(default = "d_take_or_avoid_knowns")]
    pub take_or_avoid_knowns: bool,
    /// `mcvq`: 0 selects by visit count
    #[serde(default = "d_value_quantile")]
    pub value_quantile: f64,
    /// `cdhm`: 0 disables the claim-draw pseudo-move
    #[serde(default = "d_claim_draw_halfmove")]
    pub claim_draw_halfmove: u32,
    /// `cdpr`
    #[serde(default = "d_claim_draw_prior")]
    pub claim_draw_prior: f64,
    /// `noise`
    #[serde(default = "d_unvisited_noise")]
    pub unvisited_noise: f64,
    /// `ldrw`
    #[serde(default = "d_draw_choice_correction")]
    pub draw_choice_correction: bool,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            iterations: defaults::iterations(),
            exploration: defaults::exploration(),
            temperature: defaults::temperature(),
            ramp: defaults::ramp(),
            priority_uniform: defaults::priority_uniform(),
            priority_exponent: defaults::priority_exponent(),
            value_in_log_odds: defaults::value_in_log_odds(),
            parent_prior_odds_mult: defaults::parent_prior_odds_mult(),
            parent_prior_value_diff: defaults::parent_prior_value_diff(),
            backprop_win_loss: defaults::backprop_win_loss(),
            policy_add_value_and_prior: defaults::policy_add_value_and_prior(),
            take_or_avoid_knowns: defaults::take_or_avoid_knowns(),
            value_quantile: defaults::value_quantile(),
            claim_draw_halfmove: defaults::claim_draw_halfmove(),
            claim_draw_prior: defaults::claim_draw_prior(),
            unvisited_noise: defaults::unvisited_noise(),
            draw_choice_correction: defaults::draw_choice_correction(),
        }
    }
}

/// Evaluator model configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the exported model. Empty means no model.
    #[serde(default = "d_model_path")]
    pub path: String,
    #[serde(default = "d_intra_threads")]
    pub intra_threads: usize,
    /// The policy output is logits and must be softmaxed.
    #[serde(default = "d_policy_logits")]
    pub policy_logits: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: defaults::model_path().into(),
            intra_threads: defaults::intra_threads(),
            policy_logits: defaults::policy_logits(),
        }
    }
}

impl ModelConfig {
    /// The configured model path, if any.
    pub fn path(&self) -> Option<&str> {
        let trimmed = self.path.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}
