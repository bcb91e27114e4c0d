//! Search controller.
//!
//! Runs a fixed number of simulations, each one:
//! 1. Selection: descend by priority from the root to an unexpanded node
//! 2. Expansion: score terminal positions exactly, otherwise evaluate once
//!    and create one child per legal move
//! 3. Backpropagation: fold the leaf value into every ancestor, with proof
//!    propagation when enabled

use engine_core::GameState;
use rand::Rng;
use rand_chacha::ChaCha20Rng;
use thiserror::Error;
use tracing::{debug, trace};

use crate::config::SearchConfig;
use crate::evaluator::{Evaluator, EvaluatorError};
use crate::node::{NodeId, SearchNode};
use crate::priority::priority;
use crate::selector::select_move;
use crate::tree::{BackpropOptions, SearchTree};

/// Errors that can occur during a search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Evaluator error: {0}")]
    Evaluator(#[from] EvaluatorError),

    #[error("No legal moves available")]
    NoLegalMoves,

    #[error("Game is already over")]
    GameOver,
}

/// Summary of one decision's search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchStats {
    /// Simulations run by this search.
    pub simulations: u32,
    pub root_visits: u32,
    /// Root mean value for the side to move.
    pub root_value: f64,
    pub tree_size: usize,
    pub max_depth: u32,
}

/// A chosen move plus the statistics of the search that chose it.
#[derive(Debug, Clone)]
pub struct SearchResult<M> {
    pub best_move: M,
    pub stats: SearchStats,
}

/// Search state for one decision, borrowing everything it mutates.
pub struct MctsSearch<'a, S: GameState, E: Evaluator> {
    tree: &'a mut SearchTree<S::Move>,
    evaluator: &'a mut E,
    config: &'a SearchConfig,
    rng: &'a mut ChaCha20Rng,
    check_repetition: bool,
}

impl<'a, S: GameState, E: Evaluator> MctsSearch<'a, S, E> {
    pub fn new(
        tree: &'a mut SearchTree<S::Move>,
        evaluator: &'a mut E,
        config: &'a SearchConfig,
        rng: &'a mut ChaCha20Rng,
    ) -> Self {
        Self {
            tree,
            evaluator,
            config,
            rng,
            check_repetition: false,
        }
    }

    /// Treat losing evaluations of positions with a claimable three-fold
    /// repetition as draws. Set once a repetition has occurred in the game.
    pub fn with_repetition_check(mut self, enabled: bool) -> Self {
        self.check_repetition = enabled;
        self
    }

    /// Run the configured number of simulations from `root_state`.
    ///
    /// The root is always expanded, even with a zero budget.
    pub fn run(&mut self, root_state: &S) -> Result<SearchStats, SearchError> {
        if root_state.is_over() {
            return Err(SearchError::GameOver);
        }

        let mut simulations = 0;
        for _ in 0..self.config.iterations {
            self.simulate(root_state)?;
            simulations += 1;
        }
        if !self.tree.root_node().is_expanded() {
            self.simulate(root_state)?;
            simulations += 1;
        }

        let tree_stats = self.tree.stats();
        let stats = SearchStats {
            simulations,
            root_visits: tree_stats.root_visits,
            root_value: tree_stats.root_value,
            tree_size: tree_stats.total_nodes,
            max_depth: tree_stats.max_depth,
        };
        debug!(
            simulations,
            root_visits = stats.root_visits,
            root_value = stats.root_value,
            tree_size = stats.tree_size,
            max_depth = stats.max_depth,
            "Search complete"
        );
        Ok(stats)
    }

    /// Run a single simulation (select -> expand -> backpropagate).
    pub fn simulate(&mut self, root_state: &S) -> Result<(), SearchError> {
        let mut state = root_state.clone();
        let (leaf, path) = self.select(&mut state);

        self.expand(&state, leaf)?;

        let options = BackpropOptions {
            win_loss: self.config.backprop_win_loss,
            draw_choice_correction: self.config.draw_choice_correction,
        };
        self.tree.backpropagate(&path, leaf, options);

        trace!(
            leaf = leaf.0,
            depth = path.len(),
            value = self.tree.get(leaf).mean_value(),
            "Simulation complete"
        );
        Ok(())
    }

    /// Descend from the root while nodes are expanded and the game goes on.
    /// Returns the leaf and its ancestors, root first.
    fn select(&mut self, state: &mut S) -> (NodeId, Vec<NodeId>) {
        let mut path = Vec::new();
        let mut current = self.tree.root();

        while self.tree.get(current).is_expanded() && !state.is_over() {
            let Some((mv, child)) = self.best_child(current) else {
                break;
            };
            path.push(current);
            state.play(&mv);
            current = child;
        }

        (current, path)
    }

    /// Highest-priority child of `id`; ties go to the first in enumeration order.
    fn best_child(&mut self, id: NodeId) -> Option<(S::Move, NodeId)> {
        let tree = &*self.tree;
        let parent = tree.get(id);
        let mut best: Option<(&S::Move, NodeId)> = None;
        let mut best_score = f64::NEG_INFINITY;

        for (mv, child_id) in tree.children(id) {
            let child = tree.get(*child_id);
            let noise = if child.visits == 0 && self.config.unvisited_noise > 0.0 {
                self.rng.gen::<f64>() * self.config.unvisited_noise
            } else {
                0.0
            };
            let score = priority(self.config, parent, child, noise);
            if best.is_none() || score > best_score {
                best = Some((mv, *child_id));
                best_score = score;
            }
        }

        best.map(|(mv, child)| (mv.clone(), child))
    }

    /// Expand `leaf`, whose position is `state`.
    fn expand(&mut self, state: &S, leaf: NodeId) -> Result<(), SearchError> {
        if let Some(outcome) = state.outcome() {
            let value = outcome.value_for(state.turn()) as f64;
            let node = self.tree.get_mut(leaf);
            node.visits += 1;
            node.value_sum = node.visits as f64 * value;
            return Ok(());
        }

        let input = state.encode();
        let eval = self
            .evaluator
            .evaluate(&input, S::NUM_VARIANTS, S::POLICY_SIZE)?;
        eval.validate(S::NUM_VARIANTS, S::POLICY_SIZE)?;

        let mut value = eval.mean_value();
        if value < 0.0 && self.check_repetition && state.can_claim_threefold() {
            // the side facing this position can force the draw
            value = 0.0;
        }

        let moves = state.legal_moves();
        let mut children = Vec::with_capacity(moves.len() + 1);
        for mv in moves {
            let prior = move_prior(state, &eval.policy, &mv);
            let id = self.tree.allocate(SearchNode::new(prior));
            children.push((mv, id));
        }

        let threshold = self.config.claim_draw_halfmove;
        if threshold > 0 && state.halfmove_clock() >= threshold && state.can_claim_draw() {
            if let Some(claim) = state.claim_draw_move() {
                let id = self.tree.allocate(SearchNode {
                    visits: 1,
                    value_sum: 0.0,
                    prior: self.config.claim_draw_prior,
                    children: None,
                });
                children.push((claim, id));
            }
        }

        let node = self.tree.get_mut(leaf);
        node.visits = 1;
        node.value_sum = value;
        node.children = Some(children);
        Ok(())
    }

    /// Get the search tree (for inspection/debugging).
    pub fn tree(&self) -> &SearchTree<S::Move> {
        self.tree
    }
}

/// Prior of `mv`: its policy entry averaged over all symmetry variants.
fn move_prior<S: GameState>(state: &S, policy: &[f32], mv: &S::Move) -> f64 {
    let variants = S::NUM_VARIANTS.max(1);
    let sum: f64 = (0..S::NUM_VARIANTS)
        .filter_map(|v| {
            state
                .policy_index(mv, v)
                .filter(|&idx| idx < S::POLICY_SIZE)
                .map(|idx| policy[v * S::POLICY_SIZE + idx] as f64)
        })
        .sum();
    sum / variants as f64
}

/// Convenience function to search a fresh tree and pick a move.
pub fn run_mcts<S: GameState, E: Evaluator>(
    state: &S,
    evaluator: &mut E,
    config: &SearchConfig,
    ply: u32,
    rng: &mut ChaCha20Rng,
) -> Result<SearchResult<S::Move>, SearchError> {
    let mut tree = SearchTree::new();
    let stats = MctsSearch::<S, E>::new(&mut tree, evaluator, config, rng).run(state)?;
    let best_move = select_move(&tree, config, ply, rng).ok_or(SearchError::NoLegalMoves)?;
    Ok(SearchResult { best_move, stats })
}
