//! Externally described positions.
//!
//! The protocol describes positions as
//!
//! ```text
//! startpos
//! startpos moves e2e4 e7e5 ...
//! fen rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1
//! fen rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1 moves e2e4 ...
//! ```
//!
//! `moves` may be omitted before the move list. This module only splits the
//! description; resolving it against the rules is the job of a [`GameState`].
//!
//! [`GameState`]: crate::GameState

use thiserror::Error;

/// Errors that can occur while resolving a described position.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PositionError {
    #[error("Missing FEN after 'fen'")]
    MissingFen,

    #[error("Invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("Invalid move syntax '{0}'")]
    InvalidMove(String),

    #[error("Illegal move '{mv}' in position {fen}")]
    IllegalMove { mv: String, fen: String },
}

/// A parsed `position` description.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PositionSpec {
    /// FEN of the base position; `None` means the standard initial position.
    pub fen: Option<String>,

    /// Moves to play from the base position, in protocol notation.
    pub moves: Vec<String>,
}

impl PositionSpec {
    /// The standard initial position with no moves.
    pub fn startpos() -> Self {
        Self::default()
    }

    /// Builder pattern: base position from a FEN.
    pub fn with_fen(mut self, fen: impl Into<String>) -> Self {
        self.fen = Some(fen.into());
        self
    }

    /// Builder pattern: set the move list.
    pub fn with_moves<I, S>(mut self, moves: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.moves = moves.into_iter().map(Into::into).collect();
        self
    }

    /// Parse the tokens following the `position` command.
    ///
    /// A token list that starts with neither `startpos` nor `fen` is read as
    /// a move list from the initial position, as is an empty one.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self, PositionError> {
        let tokens: Vec<&str> = tokens.iter().map(AsRef::as_ref).collect();
        let mut spec = PositionSpec::default();

        let mut pos = match tokens.first() {
            None => return Ok(spec),
            Some(&"startpos") => 1,
            Some(&"fen") => {
                let end = tokens
                    .iter()
                    .position(|t| *t == "moves")
                    .unwrap_or(tokens.len());
                if end <= 1 {
                    return Err(PositionError::MissingFen);
                }
                spec.fen = Some(tokens[1..end].join(" "));
                end
            }
            // Bare move list with no base position: treat as startpos.
            Some(_) => 0,
        };

        if tokens.get(pos) == Some(&"moves") {
            pos += 1;
        }
        spec.moves = tokens[pos..]
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string())
            .collect();

        Ok(spec)
    }
}
