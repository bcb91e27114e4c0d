//! Child priority for tree descent.
//!
//! The priority of a child is its value from the parent's perspective plus
//! an information term that shrinks as the child is visited:
//!
//! ```text
//! info = (expl / 2) * (sqrt(N_parent) / (1 + N_child)) ^ pexp
//!                   * (unif / num_children + P_child)
//! ```
//!
//! Unvisited children have no value of their own; they are estimated from
//! the parent's value (in odds space) when `ppom` or `ppvd` is set, and are
//! otherwise worth 0 plus an optional tie-break noise.

use crate::config::SearchConfig;
use crate::node::SearchNode;

/// Scores are squashed by this factor so that +-1 map to finite odds.
const SCORE_SQUASH: f64 = 0.9999;

/// Map a value in [-1, 1] to the odds of winning.
#[inline]
pub fn score_to_odds(score: f64) -> f64 {
    let prob = (SCORE_SQUASH * score + 1.0) / 2.0;
    prob / (1.0 - prob)
}

/// Inverse of [`score_to_odds`] (without undoing the squash).
#[inline]
pub fn odds_to_score(odds: f64) -> f64 {
    let prob = odds / (odds + 1.0);
    prob * 2.0 - 1.0
}

/// Value of an unvisited child from its parent's perspective.
fn unvisited_value<M>(config: &SearchConfig, parent: &SearchNode<M>, noise: f64) -> f64 {
    let parent_value = parent.mean_value();
    if config.parent_prior_odds_mult > 0.0 {
        odds_to_score(score_to_odds(parent_value) * config.parent_prior_odds_mult)
    } else if config.parent_prior_value_diff > 0.0 {
        score_to_odds(parent_value) - config.parent_prior_value_diff
    } else {
        noise
    }
}

/// Priority of `child` under `parent`. `noise` is only used for unvisited
/// children when no parent-relative estimate is configured.
pub fn priority<M>(
    config: &SearchConfig,
    parent: &SearchNode<M>,
    child: &SearchNode<M>,
    noise: f64,
) -> f64 {
    let mut move_value = if child.visits > 0 {
        -child.value_sum / child.visits as f64
    } else {
        unvisited_value(config, parent, noise)
    };

    if config.value_in_log_odds > 0.0 {
        let m = config.value_in_log_odds.clamp(0.001, 0.999);
        move_value = score_to_odds(move_value * m).ln() / (2.0 * m);
    }

    let num_children = parent.num_children().max(1) as f64;
    let visit_ratio = (parent.visits as f64).sqrt() / (1.0 + child.visits as f64);
    let info_value = config.exploration / 2.0
        * visit_ratio.powf(config.priority_exponent)
        * (config.priority_uniform / num_children + child.prior);

    move_value + info_value
}
