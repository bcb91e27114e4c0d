//! Engine session: one game's board, search tree, and repetition tracking.
//!
//! The session owns its evaluator and random source exclusively. Between
//! decisions the tree is kept and re-rooted at the move actually played, so
//! statistics gathered for the opponent's reply are reused.

use std::collections::HashSet;

use engine_core::{GameState, Player, PositionError, PositionSpec};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::evaluator::Evaluator;
use crate::search::{MctsSearch, SearchError, SearchResult, SearchStats};
use crate::selector::select_move;
use crate::tree::SearchTree;

/// Errors surfaced by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid position: {0}")]
    InvalidPosition(#[from] PositionError),

    #[error("Search failed: {0}")]
    Search(#[from] SearchError),
}

/// How [`EngineSession::position`] synchronised with the requested position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionSync {
    /// Already at the requested position; nothing changed.
    Unchanged,
    /// Reached by one legal move; the matching subtree became the root.
    Advanced,
    /// Rebuilt from scratch with a fresh root.
    Reset,
}

/// A position description resolved against the rules.
struct Resolved<S: GameState> {
    base: S,
    /// Valid moves from `base`, stopping at the first bad one.
    moves: Vec<S::Move>,
    target: S,
    error: Option<PositionError>,
}

impl<S: GameState> Resolved<S> {
    fn from_spec(spec: &PositionSpec) -> Self {
        let base = match spec.fen.as_deref() {
            None => S::start_position(),
            Some(fen) => match S::from_fen(fen) {
                Ok(state) => state,
                Err(e) => {
                    let base = S::start_position();
                    return Self {
                        target: base.clone(),
                        base,
                        moves: Vec::new(),
                        error: Some(e),
                    };
                }
            },
        };

        let mut target = base.clone();
        let mut moves = Vec::with_capacity(spec.moves.len());
        let mut error = None;
        for text in &spec.moves {
            match target.parse_move(text) {
                Ok(mv) => {
                    target.play(&mv);
                    moves.push(mv);
                }
                Err(e) => {
                    error = Some(e);
                    break;
                }
            }
        }

        Self {
            base,
            moves,
            target,
            error,
        }
    }
}

/// A single game in progress.
pub struct EngineSession<S: GameState, E: Evaluator> {
    config: SearchConfig,
    evaluator: E,
    rng: ChaCha20Rng,
    board: S,
    tree: SearchTree<S::Move>,
    /// Repetition keys seen since the last irreversible move.
    seen: HashSet<S::Key>,
    /// Set once any position has recurred in this game.
    check_repetition: bool,
    ply: u32,
}

impl<S: GameState, E: Evaluator> EngineSession<S, E> {
    /// New session at the standard initial position.
    pub fn new(config: SearchConfig, evaluator: E) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        };
        let board = S::start_position();
        let mut seen = HashSet::new();
        seen.insert(board.repetition_key());
        Self {
            config,
            evaluator,
            rng,
            board,
            tree: SearchTree::new(),
            seen,
            check_repetition: false,
            ply: 0,
        }
    }

    /// Reset to `state` with an unvisited root and no repetition history.
    pub fn start(&mut self, state: S) {
        self.seen.clear();
        self.seen.insert(state.repetition_key());
        self.board = state;
        self.tree.reset();
        self.check_repetition = false;
        self.ply = 0;
        debug!(position = %self.board.position_key(), "Session started");
    }

    /// Reset to the standard initial position.
    pub fn new_game(&mut self) {
        self.start(S::start_position());
        info!("New game");
    }

    /// Synchronise with an externally described position.
    ///
    /// Reuses the current tree when the position is unchanged or one move
    /// ahead. A malformed description leaves the session at its longest valid
    /// prefix and returns [`SessionError::InvalidPosition`].
    pub fn position(&mut self, spec: &PositionSpec) -> Result<PositionSync, SessionError> {
        let resolved = Resolved::<S>::from_spec(spec);

        if let Some(error) = resolved.error {
            warn!(%error, valid_moves = resolved.moves.len(), "Resynchronising to valid prefix");
            self.reset_to(resolved.base, &resolved.moves);
            return Err(error.into());
        }

        let target_key = resolved.target.position_key();
        if target_key == self.board.position_key() {
            debug!("Position unchanged");
            return Ok(PositionSync::Unchanged);
        }

        let reaching = self.board.legal_moves().into_iter().find(|mv| {
            let mut next = self.board.clone();
            next.play(mv);
            next.position_key() == target_key
        });
        if let Some(mv) = reaching {
            self.make_move(&mv)?;
            info!(mv = %mv, root_visits = self.tree.root_node().visits, "Reusing subtree");
            return Ok(PositionSync::Advanced);
        }

        self.reset_to(resolved.base, &resolved.moves);
        info!(moves = resolved.moves.len(), "Position reset");
        Ok(PositionSync::Reset)
    }

    /// Restart from `base` and replay already validated `moves`.
    fn reset_to(&mut self, base: S, moves: &[S::Move]) {
        self.start(base);
        for mv in moves {
            self.apply(mv);
        }
    }

    /// Play `mv` on the board, update repetition tracking and re-root the
    /// tree at the move's child.
    pub fn make_move(&mut self, mv: &S::Move) -> Result<(), SessionError> {
        let is_claim = self.is_claim_move(mv);
        let legal = if is_claim {
            self.board.can_claim_draw()
        } else {
            self.board.legal_moves().contains(mv)
        };
        if !legal {
            return Err(PositionError::IllegalMove {
                mv: mv.to_string(),
                fen: self.board.position_key(),
            }
            .into());
        }

        self.apply(mv);
        Ok(())
    }

    fn is_claim_move(&self, mv: &S::Move) -> bool {
        self.board.claim_draw_move().as_ref() == Some(mv)
    }

    fn apply(&mut self, mv: &S::Move) {
        if self.is_claim_move(mv) {
            self.board.play(mv);
        } else {
            if self.board.is_irreversible(mv) {
                self.seen.clear();
            }
            self.board.play(mv);
            if !self.seen.insert(self.board.repetition_key()) {
                if !self.check_repetition {
                    debug!(ply = self.ply + 1, "Position repeated");
                }
                self.check_repetition = true;
            }
        }
        self.ply += 1;
        self.tree.advance(mv);
    }

    /// Run the configured simulations from the current position without
    /// choosing a move.
    pub fn run_simulations(&mut self) -> Result<SearchStats, SearchError> {
        MctsSearch::<S, E>::new(
            &mut self.tree,
            &mut self.evaluator,
            &self.config,
            &mut self.rng,
        )
        .with_repetition_check(self.check_repetition)
        .run(&self.board)
    }

    /// Search, choose a move, and play it.
    pub fn search(&mut self) -> Result<SearchResult<S::Move>, SessionError> {
        let stats = self.run_simulations()?;
        let best_move = select_move(&self.tree, &self.config, self.ply, &mut self.rng)
            .ok_or(SearchError::NoLegalMoves)?;
        info!(
            mv = %best_move,
            ply = self.ply,
            root_value = stats.root_value,
            root_visits = stats.root_visits,
            "Move chosen"
        );
        self.make_move(&best_move)?;
        Ok(SearchResult { best_move, stats })
    }

    /// Mean value of the current root from `player`'s perspective.
    pub fn value(&self, player: Player) -> f64 {
        let value = self.tree.root_node().mean_value();
        if self.board.turn() == player {
            value
        } else {
            -value
        }
    }

    pub fn board(&self) -> &S {
        &self.board
    }

    pub fn tree(&self) -> &SearchTree<S::Move> {
        &self.tree
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Plies applied since the last reset.
    pub fn ply(&self) -> u32 {
        self.ply
    }

    /// Whether a position has recurred since the last reset.
    pub fn check_repetition(&self) -> bool {
        self.check_repetition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::UniformEvaluator;
    use games_chess::ChessState;

    fn session() -> EngineSession<ChessState, UniformEvaluator> {
        EngineSession::new(SearchConfig::for_testing(), UniformEvaluator::new())
    }

    #[test]
    fn test_new_session_is_at_start() {
        let s = session();
        assert_eq!(s.ply(), 0);
        assert!(!s.check_repetition());
        assert_eq!(s.tree().root_node().visits, 0);
        assert_eq!(s.board().position_key(), ChessState::start_position().position_key());
    }

    #[test]
    fn test_make_move_rejects_illegal() {
        let mut s = session();
        let e4 = s.board().parse_move("e2e4").unwrap();
        s.make_move(&e4).unwrap();
        let after = s.board().position_key();

        // the pawn has left e2
        assert!(matches!(
            s.make_move(&e4),
            Err(SessionError::InvalidPosition(PositionError::IllegalMove { .. }))
        ));
        assert_eq!(s.ply(), 1);
        assert_eq!(s.board().position_key(), after);
    }

    #[test]
    fn test_claim_requires_claimable_draw() {
        let mut s = session();
        let claim = s.board().claim_draw_move().unwrap();
        assert!(s.make_move(&claim).is_err());
    }

    #[test]
    fn test_start_clears_state() {
        let mut s = session();
        s.search().unwrap();
        assert_eq!(s.ply(), 1);

        s.new_game();
        assert_eq!(s.ply(), 0);
        assert_eq!(s.tree().len(), 1);
        assert!(!s.check_repetition());
    }

    #[test]
    fn test_seeded_sessions_agree() {
        let config = SearchConfig::for_testing()
            .with_temperature(1.0)
            .with_seed(Some(7));
        let mut a: EngineSession<ChessState, _> =
            EngineSession::new(config.clone(), UniformEvaluator::new());
        let mut b: EngineSession<ChessState, _> =
            EngineSession::new(config, UniformEvaluator::new());
        for _ in 0..4 {
            assert_eq!(a.search().unwrap().best_move, b.search().unwrap().best_move);
        }
    }
}
