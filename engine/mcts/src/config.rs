//! Search configuration parameters.
//!
//! Every field has a compact option name used on the command line
//! (`iter=400,temp=0.2,bpwl=1`); see [`SearchConfig::apply_args`].

use thiserror::Error;

/// Errors from parsing a compact `key=value` option list.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Unknown search option: {0}")]
    UnknownKey(String),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("Malformed search option {0:?}, expected key=value")]
    Malformed(String),
}

/// Configuration for the search controller, move selector and session.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// `iter`: simulations per decision.
    pub iterations: u32,

    /// `expl`: exploration coefficient of the information term.
    pub exploration: f64,

    /// `temp`: base temperature for move selection.
    /// Near zero picks the most-visited move deterministically.
    pub temperature: f64,

    /// `ramp`: plies over which the temperature blends down to `temperature`.
    pub ramp: u32,

    /// `unif`: weight of the uniform component added to each child's prior.
    pub priority_uniform: f64,

    /// `pexp`: exponent applied to `sqrt(N_parent) / (1 + N_child)`.
    pub priority_exponent: f64,

    /// `vilo`: strength of the log-odds value transform, 0 disables it.
    pub value_in_log_odds: f64,

    /// `ppom`: unvisited children estimated from the parent's odds times this.
    pub parent_prior_odds_mult: f64,

    /// `ppvd`: unvisited children estimated from the parent's odds minus this.
    pub parent_prior_value_diff: f64,

    /// `bpwl`: propagate proven wins and losses.
    pub backprop_win_loss: bool,

    /// `pavp`: add value and prior to visit counts when picking by count.
    pub policy_add_value_and_prior: bool,

    /// `toak`: always take proven wins and avoid proven losses.
    pub take_or_avoid_knowns: bool,

    /// `mcvq`: quantile for value-based move choice; 0 picks by visit count.
    pub value_quantile: f64,

    /// `cdhm`: half-move clock at which a claimable draw is offered as a
    /// pseudo-move during expansion; 0 disables it.
    pub claim_draw_halfmove: u32,

    /// `cdpr`: prior of the claim-draw pseudo-move.
    pub claim_draw_prior: f64,

    /// `noise`: amplitude of the random tie-break for unvisited children.
    pub unvisited_noise: f64,

    /// `ldrw`: propagate 0 through an ancestor holding a single drawn visit.
    pub draw_choice_correction: bool,

    /// `seed`: session RNG seed; `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            iterations: 200,
            exploration: 0.3,
            temperature: 0.1,
            ramp: 10,
            priority_uniform: 1.0,
            priority_exponent: 2.0,
            value_in_log_odds: 0.0,
            parent_prior_odds_mult: 0.0,
            parent_prior_value_diff: 0.0,
            backprop_win_loss: false,
            policy_add_value_and_prior: false,
            take_or_avoid_knowns: false,
            value_quantile: 0.0,
            claim_draw_halfmove: 8,
            claim_draw_prior: 0.1,
            unvisited_noise: 0.0,
            draw_choice_correction: false,
            seed: None,
        }
    }
}

impl SearchConfig {
    /// Create a fast, deterministic config for testing.
    pub fn for_testing() -> Self {
        Self {
            iterations: 50,
            temperature: 0.0,
            seed: Some(42),
            ..Self::default()
        }
    }

    /// Parse a compact option list on top of the defaults.
    pub fn from_args(args: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_args(args)?;
        Ok(config)
    }

    /// Apply a comma-separated `key=value` list, e.g. `iter=400,temp=0.2,bpwl=1`.
    ///
    /// Blank entries are skipped. On error the config may be partially updated.
    pub fn apply_args(&mut self, args: &str) -> Result<(), ConfigError> {
        for entry in args.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (key, value) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::Malformed(entry.to_string()))?;
            self.apply_arg(key.trim(), value.trim())?;
        }
        Ok(())
    }

    /// Set a single option by its compact name.
    pub fn apply_arg(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "iter" => self.iterations = parse(key, value)?,
            "expl" => self.exploration = parse(key, value)?,
            "temp" => self.temperature = parse(key, value)?,
            "ramp" => self.ramp = parse(key, value)?,
            "unif" => self.priority_uniform = parse(key, value)?,
            "pexp" => self.priority_exponent = parse(key, value)?,
            "vilo" => self.value_in_log_odds = parse(key, value)?,
            "ppom" => self.parent_prior_odds_mult = parse(key, value)?,
            "ppvd" => self.parent_prior_value_diff = parse(key, value)?,
            "bpwl" => self.backprop_win_loss = parse_flag(key, value)?,
            "pavp" => self.policy_add_value_and_prior = parse_flag(key, value)?,
            "toak" => self.take_or_avoid_knowns = parse_flag(key, value)?,
            "mcvq" => self.value_quantile = parse(key, value)?,
            "cdhm" => self.claim_draw_halfmove = parse(key, value)?,
            "cdpr" => self.claim_draw_prior = parse(key, value)?,
            "noise" => self.unvisited_noise = parse(key, value)?,
            "ldrw" => self.draw_choice_correction = parse_flag(key, value)?,
            "seed" => {
                let seed: u64 = parse(key, value)?;
                self.seed = (seed != 0).then_some(seed);
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Builder pattern: set number of simulations.
    pub fn with_iterations(mut self, n: u32) -> Self {
        self.iterations = n;
        self
    }

    /// Builder pattern: set the exploration coefficient.
    pub fn with_exploration(mut self, c: f64) -> Self {
        self.exploration = c;
        self
    }

    /// Builder pattern: set the base temperature.
    pub fn with_temperature(mut self, t: f64) -> Self {
        self.temperature = t;
        self
    }

    /// Builder pattern: set the temperature ramp in plies.
    pub fn with_ramp(mut self, plies: u32) -> Self {
        self.ramp = plies;
        self
    }

    /// Builder pattern: set the uniform prior weight.
    pub fn with_priority_uniform(mut self, w: f64) -> Self {
        self.priority_uniform = w;
        self
    }

    /// Builder pattern: enable or disable proof propagation.
    pub fn with_backprop_win_loss(mut self, enabled: bool) -> Self {
        self.backprop_win_loss = enabled;
        self
    }

    /// Builder pattern: take proven wins and avoid proven losses.
    pub fn with_take_or_avoid_knowns(mut self, enabled: bool) -> Self {
        self.take_or_avoid_knowns = enabled;
        self
    }

    /// Builder pattern: pick moves by value quantile (0 picks by count).
    pub fn with_value_quantile(mut self, q: f64) -> Self {
        self.value_quantile = q;
        self
    }

    /// Builder pattern: set the claim-draw half-move threshold (0 disables).
    pub fn with_claim_draw_halfmove(mut self, halfmoves: u32) -> Self {
        self.claim_draw_halfmove = halfmoves;
        self
    }

    /// Builder pattern: set the session seed.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Flags accept `true`/`false` or an integer, non-zero meaning enabled.
fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    if let Ok(n) = value.parse::<i64>() {
        return Ok(n != 0);
    }
    parse(key, value)
}
