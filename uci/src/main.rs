//! rookery-uci - MCTS chess engine speaking the UCI protocol
//!
//! Reads commands from stdin and answers on stdout. All logging goes to
//! stderr so it never interleaves with protocol replies.

use std::io;

use anyhow::Result;
use clap::Parser;
use games_chess::ChessState;
use mcts::{EngineSession, Evaluator, UniformEvaluator};
use tracing::{info, warn};

mod config;
mod protocol;

use crate::config::Config;

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    Ok(())
}

#[cfg(feature = "onnx")]
fn build_evaluator(config: &Config) -> Result<Box<dyn Evaluator>> {
    use anyhow::Context;
    use mcts::OnnxEvaluator;

    match config.model_path() {
        Some(path) => {
            let evaluator =
                OnnxEvaluator::load(path, [games_chess::CHANNELS, 8, 8], config.intra_threads)
                    .with_context(|| format!("failed to load model {}", path))?
                    .with_policy_logits(config.policy_logits);
            Ok(Box::new(evaluator))
        }
        None => {
            warn!("No model configured, using uniform evaluator");
            Ok(Box::new(UniformEvaluator::new()))
        }
    }
}

#[cfg(not(feature = "onnx"))]
fn build_evaluator(config: &Config) -> Result<Box<dyn Evaluator>> {
    match config.model_path() {
        Some(path) => warn!(path, "Built without the onnx feature, using uniform evaluator"),
        None => warn!("No model configured, using uniform evaluator"),
    }
    Ok(Box::new(UniformEvaluator::new()))
}

fn main() -> Result<()> {
    let config = Config::parse();
    config.validate()?;

    init_tracing(&config.log_level)?;
    info!(log_level = %config.log_level, "Tracing initialized");

    let search = config.search_config()?;
    info!(
        iterations = search.iterations,
        exploration = search.exploration,
        temperature = search.temperature,
        value_quantile = search.value_quantile,
        backprop_win_loss = search.backprop_win_loss,
        seed = ?search.seed,
        "Search configuration"
    );

    let evaluator = build_evaluator(&config)?;
    let mut session: EngineSession<ChessState, Box<dyn Evaluator>> =
        EngineSession::new(search, evaluator);

    let stdin = io::stdin();
    let stdout = io::stdout();
    protocol::run_loop(&mut session, stdin.lock(), stdout.lock())?;

    info!("Engine stopped");
    Ok(())
}
