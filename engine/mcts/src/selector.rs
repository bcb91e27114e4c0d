//! Move selection from root statistics.
//!
//! Two strategies, chosen by [`SearchConfig::value_quantile`]:
//! - by visit count: sample from the temperature-scaled visit distribution
//! - by value quantile: treat each child's (value, count) as Beta
//!   pseudo-observations and pick the best quantile plus a temperature-scaled
//!   Beta sample

use std::fmt::Display;

use rand::distributions::WeightedIndex;
use rand_chacha::ChaCha20Rng;
use rand_distr::{Beta, Distribution};
use tracing::debug;

use crate::beta::inv_inc_beta;
use crate::config::SearchConfig;
use crate::priority::priority;
use crate::tree::SearchTree;

/// Bonus applied to proven outcomes when `toak` is set.
const KNOWN_OUTCOME_BONUS: f64 = 10_000.0;

/// Floor for count weights after the proven-outcome adjustment.
const MIN_WEIGHT: f64 = 1e-6;

/// Temperatures below this select the maximum deterministically.
const MIN_TEMPERATURE: f64 = 1e-6;

/// A root child as seen by the side to move at the root.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildSummary<M> {
    pub mv: M,
    pub visits: u32,
    /// `-W / max(1, N)`: the child's value for the root's mover.
    pub value: f64,
    pub prior: f64,
}

/// Summaries of the root's children in enumeration order.
pub fn root_children<M: Clone + PartialEq>(tree: &SearchTree<M>) -> Vec<ChildSummary<M>> {
    tree.children(tree.root())
        .iter()
        .map(|(mv, id)| {
            let node = tree.get(*id);
            ChildSummary {
                mv: mv.clone(),
                visits: node.visits,
                value: -node.value_sum / node.visits.max(1) as f64,
                prior: node.prior,
            }
        })
        .collect()
}

/// Temperature for the given ply: starts at `min(1, 10 * temperature)` and
/// blends linearly to `temperature` over `ramp` plies.
pub fn effective_temperature(temperature: f64, ramp: u32, ply: u32) -> f64 {
    let p = if ramp == 0 {
        1.0
    } else {
        (ply as f64 / ramp as f64).clamp(0.0, 1.0)
    };
    p * temperature + (1.0 - p) * f64::min(1.0, temperature * 10.0)
}

/// First index holding the maximum (NaN never wins).
fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some(b) if values[b] >= v => {}
            _ => best = Some(i),
        }
    }
    best.or(if values.is_empty() { None } else { Some(0) })
}

fn one_hot(len: usize, index: usize) -> Vec<f64> {
    let mut out = vec![0.0; len];
    out[index] = 1.0;
    out
}

/// Selection probabilities of the by-count strategy at `temperature`.
pub fn count_distribution<M>(
    children: &[ChildSummary<M>],
    config: &SearchConfig,
    temperature: f64,
) -> Vec<f64> {
    if children.is_empty() {
        return Vec::new();
    }

    let policy_weight = if config.policy_add_value_and_prior {
        1.0
    } else {
        0.0
    };
    let mut weights: Vec<f64> = children
        .iter()
        .map(|c| {
            let mut w = c.visits as f64 + policy_weight * (c.value + c.prior);
            if config.take_or_avoid_knowns {
                if c.value == 1.0 {
                    w += KNOWN_OUTCOME_BONUS;
                } else if c.value == -1.0 {
                    w -= KNOWN_OUTCOME_BONUS;
                }
                w = w.max(MIN_WEIGHT);
            }
            if w > 0.0 {
                w
            } else {
                0.0
            }
        })
        .collect();

    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        let n = weights.len() as f64;
        weights.iter_mut().for_each(|w| *w = 1.0 / n);
    } else {
        weights.iter_mut().for_each(|w| *w /= total);
    }

    if temperature < MIN_TEMPERATURE {
        return argmax(&weights).map_or(weights.clone(), |i| one_hot(weights.len(), i));
    }

    let scaled: Vec<f64> = weights.iter().map(|w| w.powf(1.0 / temperature)).collect();
    let total: f64 = scaled.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return argmax(&weights).map_or(weights.clone(), |i| one_hot(weights.len(), i));
    }
    scaled.into_iter().map(|w| w / total).collect()
}

fn sample_index(distribution: &[f64], rng: &mut ChaCha20Rng) -> Option<usize> {
    match WeightedIndex::new(distribution) {
        Ok(dist) => Some(dist.sample(rng)),
        Err(_) => argmax(distribution),
    }
}

/// Pick a child index by sampling the count distribution for `ply`.
pub fn select_by_count<M>(
    children: &[ChildSummary<M>],
    config: &SearchConfig,
    ply: u32,
    rng: &mut ChaCha20Rng,
) -> Option<usize> {
    let temperature = effective_temperature(config.temperature, config.ramp, ply);
    sample_index(&count_distribution(children, config, temperature), rng)
}

/// Beta pseudo-observation parameters for a child.
fn beta_params<M>(child: &ChildSummary<M>, config: &SearchConfig) -> (f64, f64) {
    let prob = (child.value * 0.9999 + 1.0) / 2.0;
    let mut count = child.visits as f64;
    if config.take_or_avoid_knowns && child.value.abs() == 1.0 {
        count += KNOWN_OUTCOME_BONUS;
    }
    // small offsets keep both parameters positive and bias low counts down
    let alpha = prob * (count + 0.001);
    let beta = (1.0 - prob) * (count + 1.0);
    (alpha, beta)
}

/// Per-child scores of the value-quantile strategy.
pub fn quantile_scores<M>(
    children: &[ChildSummary<M>],
    config: &SearchConfig,
    rng: &mut ChaCha20Rng,
) -> Vec<f64> {
    children
        .iter()
        .map(|child| {
            let (alpha, beta) = beta_params(child, config);
            let quantile = inv_inc_beta(alpha, beta, config.value_quantile);
            let sample = Beta::new(alpha, beta)
                .map(|d| d.sample(rng))
                .ok()
                .filter(|s| s.is_finite())
                .unwrap_or(0.0);
            quantile + sample * config.temperature
        })
        .collect()
}

/// Pick the child with the best quantile-plus-noise score.
pub fn select_by_value_quantile<M>(
    children: &[ChildSummary<M>],
    config: &SearchConfig,
    rng: &mut ChaCha20Rng,
) -> Option<usize> {
    argmax(&quantile_scores(children, config, rng))
}

/// Choose the move to play from the root's children, or `None` if the root
/// has none.
pub fn select_move<M: Clone + PartialEq + Display>(
    tree: &SearchTree<M>,
    config: &SearchConfig,
    ply: u32,
    rng: &mut ChaCha20Rng,
) -> Option<M> {
    let children = root_children(tree);
    if children.is_empty() {
        return None;
    }

    let (weights, index) = if config.value_quantile > 0.0 {
        let scores = quantile_scores(&children, config, rng);
        let index = argmax(&scores)?;
        (scores, index)
    } else {
        let temperature = effective_temperature(config.temperature, config.ramp, ply);
        let distribution = count_distribution(&children, config, temperature);
        let index = sample_index(&distribution, rng)?;
        (distribution, index)
    };

    let root = tree.root_node();
    debug!(value = root.mean_value(), ply, "Root");
    for ((child, weight), (_, id)) in children
        .iter()
        .zip(&weights)
        .zip(tree.children(tree.root()))
    {
        debug!(
            mv = %child.mv,
            weight,
            visits = child.visits,
            value = child.value,
            prior = child.prior,
            priority = priority(config, root, tree.get(*id), 0.0),
            "Candidate"
        );
    }

    Some(children[index].mv.clone())
}
