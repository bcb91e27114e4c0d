//! Line-oriented UCI command loop.
//!
//! Supported commands:
//!
//! ```text
//! uci                                   -> id name / id author / uciok
//! isready                               -> readyok
//! ucinewgame                            -> reset the session
//! position [startpos | fen <fen>] [moves <uci>...]
//! go [...]                              -> bestmove <uci> (0000 if no move)
//! quit
//! ```
//!
//! Search limits after `go` are ignored; every decision runs the configured
//! number of simulations. Blank lines and unknown commands are skipped.

use std::io::{BufRead, Write};

use anyhow::Result;
use engine_core::{GameState, PositionSpec};
use mcts::{EngineSession, Evaluator, PositionSync, SearchError, SessionError};
use tracing::{debug, error, info, warn};

pub const ENGINE_NAME: &str = concat!("rookery ", env!("CARGO_PKG_VERSION"));
pub const ENGINE_AUTHOR: &str = "the rookery developers";

/// Sent as `bestmove` when no move can be searched, so the GUI is not left
/// waiting.
const NULL_MOVE: &str = "0000";

/// What the loop should do after a command.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Read commands from `input` until `quit` or end of input, writing replies
/// to `output`.
pub fn run_loop<S, E, R, W>(session: &mut EngineSession<S, E>, input: R, mut output: W) -> Result<()>
where
    S: GameState,
    E: Evaluator,
    R: BufRead,
    W: Write,
{
    for line in input.lines() {
        let line = line?;
        if handle_line(session, &line, &mut output)? == Flow::Quit {
            info!("Quit received");
            break;
        }
        output.flush()?;
    }
    Ok(())
}

fn handle_line<S, E, W>(session: &mut EngineSession<S, E>, line: &str, output: &mut W) -> Result<Flow>
where
    S: GameState,
    E: Evaluator,
    W: Write,
{
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&command, args)) = tokens.split_first() else {
        return Ok(Flow::Continue);
    };

    match command {
        "uci" => {
            writeln!(output, "id name {}", ENGINE_NAME)?;
            writeln!(output, "id author {}", ENGINE_AUTHOR)?;
            writeln!(output, "uciok")?;
        }
        "isready" => writeln!(output, "readyok")?,
        "ucinewgame" => session.new_game(),
        "position" => handle_position(session, args),
        "go" => match handle_go(session) {
            Some(best_move) => writeln!(output, "bestmove {}", best_move)?,
            None => writeln!(output, "bestmove {}", NULL_MOVE)?,
        },
        "quit" => return Ok(Flow::Quit),
        _ => debug!(command, "Ignoring unknown command"),
    }
    Ok(Flow::Continue)
}

fn handle_position<S: GameState, E: Evaluator>(session: &mut EngineSession<S, E>, args: &[&str]) {
    let spec = match PositionSpec::from_tokens(args) {
        Ok(spec) => spec,
        Err(e) => {
            warn!(error = %e, "Malformed position command, resetting to the initial position");
            session.start(S::start_position());
            return;
        }
    };

    match session.position(&spec) {
        Ok(PositionSync::Unchanged) => debug!("Position already current"),
        Ok(sync) => debug!(?sync, ply = session.ply(), "Position synchronised"),
        Err(e) => warn!(error = %e, "Invalid position"),
    }
}

fn handle_go<S: GameState, E: Evaluator>(session: &mut EngineSession<S, E>) -> Option<S::Move> {
    match session.search() {
        Ok(result) => Some(result.best_move),
        Err(SessionError::Search(SearchError::GameOver)) => {
            warn!("Search requested in a finished game");
            None
        }
        Err(e) => {
            error!(error = %e, "Search failed");
            None
        }
    }
}
