//! Monte Carlo Tree Search for two-player, zero-sum games.
//!
//! This crate provides the search core of the rookery engine. It works with
//! any game implementing the `engine-core` [`GameState`] trait and any
//! [`Evaluator`] that maps an encoded position to a value and a policy.
//!
//! # Overview
//!
//! Each simulation consists of three phases:
//!
//! 1. **Selection**: descend from the root by priority (value plus an
//!    information term that shrinks with visits)
//! 2. **Expansion**: score terminal positions exactly, otherwise call the
//!    evaluator once and create one child per legal move with its prior
//! 3. **Backpropagation**: fold the leaf value into every ancestor with
//!    alternating sign, propagating forced wins and losses when enabled
//!
//! After the simulations a [`selector`] strategy picks the move to play,
//! either by visit count or by a Beta value quantile.
//!
//! # Usage
//!
//! ```rust,ignore
//! use engine_core::{Player, PositionSpec};
//! use games_chess::ChessState;
//! use mcts::{EngineSession, SearchConfig, UniformEvaluator};
//!
//! let config = SearchConfig::from_args("iter=400,bpwl=1")?;
//! let mut session: EngineSession<ChessState, _> =
//!     EngineSession::new(config, UniformEvaluator::new());
//!
//! session.position(&PositionSpec::startpos().with_moves(["e2e4"]))?;
//! let result = session.search()?;
//! println!("bestmove {}", result.best_move);
//! println!("value {}", session.value(Player::White));
//! ```
//!
//! # Architecture
//!
//! ```text
//! EngineSession (board, repetition keys, rng, evaluator)
//!   └── SearchTree (arena of SearchNode, re-rooted between moves)
//!         ├── MctsSearch: select -> expand -> backpropagate
//!         └── selector: by visit count | by value quantile
//! ```
//!
//! [`GameState`]: engine_core::GameState

pub mod beta;
pub mod config;
pub mod evaluator;
pub mod node;
pub mod priority;
pub mod search;
pub mod selector;
pub mod session;
pub mod tree;

#[cfg(feature = "onnx")]
pub mod onnx;

// Re-export main types
pub use config::{ConfigError, SearchConfig};
pub use evaluator::{EvalResult, Evaluator, EvaluatorError, UniformEvaluator};
pub use node::{NodeId, SearchNode};
pub use search::{run_mcts, MctsSearch, SearchError, SearchResult, SearchStats};
pub use selector::{select_move, ChildSummary};
pub use session::{EngineSession, PositionSync, SessionError};
pub use tree::{BackpropOptions, SearchTree, TreeStats};

#[cfg(feature = "onnx")]
pub use onnx::OnnxEvaluator;
