//! Rules adapter trait used by the search.
//!
//! The search never inspects a board directly. Everything it needs from the
//! rules library (move generation, terminal and draw detection, repetition
//! keys, evaluator encoding) goes through [`GameState`].

use std::fmt::{Debug, Display};
use std::hash::Hash;

use crate::position::PositionError;

/// One of the two sides of a zero-sum game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    White,
    Black,
}

impl Player {
    /// The other side.
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::White => Player::Black,
            Player::Black => Player::White,
        }
    }
}

/// Result of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win(Player),
    Draw,
}

impl Outcome {
    /// Outcome value from `player`'s perspective: +1 win, -1 loss, 0 draw.
    ///
    /// # Example
    /// ```
    /// use engine_core::{Outcome, Player};
    ///
    /// assert_eq!(Outcome::Win(Player::White).value_for(Player::White), 1.0);
    /// assert_eq!(Outcome::Win(Player::White).value_for(Player::Black), -1.0);
    /// assert_eq!(Outcome::Draw.value_for(Player::Black), 0.0);
    /// ```
    #[inline]
    pub fn value_for(self, player: Player) -> f32 {
        match self {
            Outcome::Win(winner) if winner == player => 1.0,
            Outcome::Win(_) => -1.0,
            Outcome::Draw => 0.0,
        }
    }
}

/// Rules adapter for a two-player, zero-sum, perfect-information game.
///
/// Implementations are cheap to clone: the search clones the root state once
/// per simulation and plays moves forward on the copy.
pub trait GameState: Clone + Debug + Sized {
    /// Move type. Used as the key of a node's child list, so equality must be
    /// exact and `Display` must produce the protocol spelling.
    type Move: Clone + Eq + Hash + Debug + Display;

    /// Repetition key: placement plus side to move, ignoring move counters.
    type Key: Clone + Eq + Hash + Debug;

    /// Number of symmetry variants produced by [`GameState::encode`].
    const NUM_VARIANTS: usize;

    /// Size of the per-variant policy vector returned by the evaluator.
    const POLICY_SIZE: usize;

    /// Standard initial position.
    fn start_position() -> Self;

    /// Position from a FEN-style description.
    fn from_fen(fen: &str) -> Result<Self, PositionError>;

    /// Parse a move in protocol notation and check it is legal here.
    fn parse_move(&self, text: &str) -> Result<Self::Move, PositionError>;

    /// All legal moves in a stable enumeration order.
    fn legal_moves(&self) -> Vec<Self::Move>;

    /// Side to move.
    fn turn(&self) -> Player;

    /// Terminal result, including a draw that has already been claimed.
    fn outcome(&self) -> Option<Outcome>;

    /// Whether the side to move may claim a draw right now.
    fn can_claim_draw(&self) -> bool;

    /// Whether a three-fold repetition claim is available right now.
    fn can_claim_threefold(&self) -> bool;

    /// Plies since the last irreversible move.
    fn halfmove_clock(&self) -> u32;

    /// Pseudo-move that claims a draw, if the game has one.
    fn claim_draw_move(&self) -> Option<Self::Move> {
        None
    }

    /// Whether `mv` can never be undone by later moves (capture, pawn move,
    /// loss of castling rights).
    fn is_irreversible(&self, mv: &Self::Move) -> bool;

    /// Apply a legal move (or the claim-draw pseudo-move).
    fn play(&mut self, mv: &Self::Move);

    /// Canonical key for repetition detection.
    fn repetition_key(&self) -> Self::Key;

    /// Full description of the position including move counters. Two states
    /// describe the same externally visible position iff their keys match.
    fn position_key(&self) -> String;

    /// Evaluator input for all symmetry variants, flattened variant-major.
    fn encode(&self) -> Vec<f32>;

    /// Index of `mv` in the policy vector of `variant`, or `None` for moves
    /// the evaluator has no output for (such as a draw claim).
    fn policy_index(&self, mv: &Self::Move, variant: usize) -> Option<usize>;

    /// Convenience: terminal or claimed-draw state.
    #[inline]
    fn is_over(&self) -> bool {
        self.outcome().is_some()
    }
}
