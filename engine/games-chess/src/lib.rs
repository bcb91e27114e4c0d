//! Chess rules adapter for the rookery search engine.
//!
//! Wraps a `shakmaty` position and adds the bookkeeping the search needs but
//! the rules library does not keep: repetition keys since the last
//! irreversible move, draw claims, and the automatic seventy-five-move and
//! five-fold repetition draws.
//!
//! Moves are `shakmaty::uci::UciMove` values in standard castling notation.
//! `UciMove::Null` (`0000`) is the claim-draw pseudo-move.

use engine_core::{GameState, Outcome, Player, PositionError};
use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Position};
use tracing::warn;

pub mod encoding;

pub use encoding::{policy_index, CHANNELS, INPUT_SIZE, NUM_VARIANTS, POLICY_SIZE};

/// FEN of the standard initial position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Half-move clock at which either side may claim a draw.
const FIFTY_MOVE_CLAIM: u32 = 100;

/// Half-move clock at which the game is drawn automatically.
const SEVENTY_FIVE_MOVE_DRAW: u32 = 150;

/// Chess position plus the history the search needs.
#[derive(Debug, Clone)]
pub struct ChessState {
    pos: Chess,
    /// Repetition keys since the last irreversible move, current one last.
    history: Vec<String>,
    draw_claimed: bool,
}

impl ChessState {
    fn from_position(pos: Chess) -> Self {
        let key = repetition_key_of(&pos);
        Self {
            pos,
            history: vec![key],
            draw_claimed: false,
        }
    }

    /// Underlying rules-library position.
    pub fn position(&self) -> &Chess {
        &self.pos
    }

    /// Full FEN of the current position.
    pub fn fen(&self) -> String {
        Fen::from_position(self.pos.clone(), EnPassantMode::Legal).to_string()
    }

    /// Whether a draw has been claimed with the null move.
    pub fn draw_claimed(&self) -> bool {
        self.draw_claimed
    }

    /// How many times the current repetition key has occurred since the last
    /// irreversible move, including now.
    pub fn repetition_count(&self) -> usize {
        match self.history.last() {
            Some(current) => self.history.iter().filter(|k| *k == current).count(),
            None => 0,
        }
    }
}

impl Default for ChessState {
    fn default() -> Self {
        Self::from_position(Chess::default())
    }
}

fn player_of(color: Color) -> Player {
    match color {
        Color::White => Player::White,
        Color::Black => Player::Black,
    }
}

fn repetition_key_of(pos: &Chess) -> String {
    let side = match pos.turn() {
        Color::White => 'w',
        Color::Black => 'b',
    };
    format!("{} {}", pos.board(), side)
}

impl GameState for ChessState {
    type Move = UciMove;
    type Key = String;

    const NUM_VARIANTS: usize = NUM_VARIANTS;
    const POLICY_SIZE: usize = POLICY_SIZE;

    fn start_position() -> Self {
        Self::default()
    }

    fn from_fen(fen: &str) -> Result<Self, PositionError> {
        let parsed: Fen = fen.trim().parse().map_err(|e| PositionError::InvalidFen {
            fen: fen.to_string(),
            reason: format!("{}", e),
        })?;
        let pos: Chess =
            parsed
                .into_position(CastlingMode::Standard)
                .map_err(|e| PositionError::InvalidFen {
                    fen: fen.to_string(),
                    reason: format!("{}", e),
                })?;
        Ok(Self::from_position(pos))
    }

    fn parse_move(&self, text: &str) -> Result<UciMove, PositionError> {
        let uci: UciMove = text
            .parse()
            .map_err(|_| PositionError::InvalidMove(text.to_string()))?;

        if uci == UciMove::Null {
            return if self.can_claim_draw() {
                Ok(uci)
            } else {
                Err(PositionError::IllegalMove {
                    mv: text.to_string(),
                    fen: self.fen(),
                })
            };
        }

        let m = uci
            .to_move(&self.pos)
            .map_err(|_| PositionError::IllegalMove {
                mv: text.to_string(),
                fen: self.fen(),
            })?;
        Ok(m.to_uci(CastlingMode::Standard))
    }

    fn legal_moves(&self) -> Vec<UciMove> {
        if self.draw_claimed {
            return Vec::new();
        }
        self.pos
            .legal_moves()
            .iter()
            .map(|m| m.to_uci(CastlingMode::Standard))
            .collect()
    }

    fn turn(&self) -> Player {
        player_of(self.pos.turn())
    }

    fn outcome(&self) -> Option<Outcome> {
        if self.draw_claimed {
            return Some(Outcome::Draw);
        }
        match self.pos.outcome() {
            Some(shakmaty::Outcome::Decisive { winner }) => Some(Outcome::Win(player_of(winner))),
            Some(shakmaty::Outcome::Draw) => Some(Outcome::Draw),
            None if self.pos.halfmoves() >= SEVENTY_FIVE_MOVE_DRAW => Some(Outcome::Draw),
            None if self.repetition_count() >= 5 => Some(Outcome::Draw),
            None => None,
        }
    }

    fn can_claim_draw(&self) -> bool {
        !self.draw_claimed
            && (self.pos.halfmoves() >= FIFTY_MOVE_CLAIM || self.can_claim_threefold())
    }

    fn can_claim_threefold(&self) -> bool {
        self.repetition_count() >= 3
    }

    fn halfmove_clock(&self) -> u32 {
        self.pos.halfmoves()
    }

    fn claim_draw_move(&self) -> Option<UciMove> {
        Some(UciMove::Null)
    }

    fn is_irreversible(&self, mv: &UciMove) -> bool {
        let Ok(m) = mv.to_move(&self.pos) else {
            return false;
        };
        if m.is_zeroing() || m.is_castle() {
            return true;
        }
        let mut after = self.pos.clone();
        after.play_unchecked(&m);
        after.castles().castling_rights() != self.pos.castles().castling_rights()
    }

    fn play(&mut self, mv: &UciMove) {
        if *mv == UciMove::Null {
            self.draw_claimed = true;
            return;
        }
        let m = match mv.to_move(&self.pos) {
            Ok(m) => m,
            Err(e) => {
                warn!(mv = %mv, fen = %self.fen(), error = %e, "Ignoring illegal move");
                return;
            }
        };
        let irreversible = self.is_irreversible(mv);
        self.pos.play_unchecked(&m);
        if irreversible {
            self.history.clear();
        }
        self.history.push(repetition_key_of(&self.pos));
    }

    fn repetition_key(&self) -> String {
        repetition_key_of(&self.pos)
    }

    fn position_key(&self) -> String {
        self.fen()
    }

    fn encode(&self) -> Vec<f32> {
        encoding::model_input(&self.pos)
    }

    fn policy_index(&self, mv: &UciMove, variant: usize) -> Option<usize> {
        policy_index(mv, variant)
    }
}
