//! Core traits and types for the rookery search engine
//!
//! This crate provides the abstractions the search depends on without
//! implementing any game rules itself:
//! - `GameState`: Rules adapter (legal moves, outcomes, repetition bookkeeping,
//!   model-input encoding and policy indexing)
//! - `Player` / `Outcome`: Side to move and game results
//! - `PositionSpec`: Parsed form of an externally described position
//!   (`startpos` or `fen ...`, optionally followed by `moves ...`)

pub mod game;
pub mod position;

// Re-export main types for convenience
pub use game::{GameState, Outcome, Player};
pub use position::{PositionError, PositionSpec};
