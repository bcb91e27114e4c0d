//! Engine session behaviour on real chess positions.

use engine_core::{GameState, Player, PositionError, PositionSpec};
use games_chess::ChessState;
use mcts::{EngineSession, PositionSync, SearchConfig, SessionError, UniformEvaluator};

type Session = EngineSession<ChessState, UniformEvaluator>;

fn session(config: SearchConfig) -> Session {
    EngineSession::new(config, UniformEvaluator::new())
}

fn state_after(moves: &[&str]) -> ChessState {
    let mut state = ChessState::start_position();
    for m in moves {
        let mv = state.parse_move(m).unwrap();
        state.play(&mv);
    }
    state
}

fn play(session: &mut Session, moves: &[&str]) {
    for m in moves {
        let mv = session.board().parse_move(m).unwrap();
        session.make_move(&mv).unwrap();
    }
}

#[test]
fn position_one_move_ahead_reuses_subtree() {
    let mut s = session(SearchConfig::for_testing().with_iterations(200));
    s.run_simulations().unwrap();

    let e4 = s.board().parse_move("e2e4").unwrap();
    let tree = s.tree();
    let e4_id = tree.child(tree.root(), &e4).unwrap();
    let e4_visits = tree.get(e4_id).visits;
    let e4_value = tree.get(e4_id).value_sum;
    let grandchild_visits: Vec<u32> = tree
        .children(e4_id)
        .iter()
        .map(|(_, id)| tree.get(*id).visits)
        .collect();
    assert!(e4_visits > 0);

    let sync = s
        .position(&PositionSpec::startpos().with_moves(["e2e4"]))
        .unwrap();
    assert_eq!(sync, PositionSync::Advanced);

    let tree = s.tree();
    assert_eq!(tree.root_node().visits, e4_visits);
    assert_eq!(tree.root_node().value_sum, e4_value);
    let kept: Vec<u32> = tree
        .children(tree.root())
        .iter()
        .map(|(_, id)| tree.get(*id).visits)
        .collect();
    assert_eq!(kept, grandchild_visits);
    assert_eq!(s.ply(), 1);
}

#[test]
fn position_with_unrelated_fen_resets_tree() {
    let mut s = session(SearchConfig::for_testing());
    s.run_simulations().unwrap();
    assert!(s.tree().len() > 1);

    let fen = "8/5k2/8/3K4/8/8/4P3/8 w - - 0 1";
    let sync = s.position(&PositionSpec::startpos().with_fen(fen)).unwrap();
    assert_eq!(sync, PositionSync::Reset);
    assert_eq!(s.tree().len(), 1);
    assert_eq!(s.tree().root_node().visits, 0);
    assert_eq!(s.board().fen(), fen);
    assert_eq!(s.ply(), 0);
}

#[test]
fn position_unchanged_keeps_tree() {
    let mut s = session(SearchConfig::for_testing());
    play(&mut s, &["d2d4"]);
    s.run_simulations().unwrap();
    let visits = s.tree().root_node().visits;

    let sync = s
        .position(&PositionSpec::startpos().with_moves(["d2d4"]))
        .unwrap();
    assert_eq!(sync, PositionSync::Unchanged);
    assert_eq!(s.tree().root_node().visits, visits);
}

#[test]
fn position_two_moves_ahead_replays_from_scratch() {
    let mut s = session(SearchConfig::for_testing());
    s.run_simulations().unwrap();

    let sync = s
        .position(&PositionSpec::startpos().with_moves(["e2e4", "e7e5"]))
        .unwrap();
    assert_eq!(sync, PositionSync::Reset);
    assert_eq!(s.ply(), 2);
    assert_eq!(s.tree().root_node().visits, 0);
    assert_eq!(
        s.board().position_key(),
        state_after(&["e2e4", "e7e5"]).position_key()
    );
}

#[test]
fn illegal_move_resyncs_to_valid_prefix() {
    let mut s = session(SearchConfig::for_testing());
    let err = s
        .position(&PositionSpec::startpos().with_moves(["e2e4", "e7e5", "e1e5"]))
        .unwrap_err();

    assert!(matches!(
        err,
        SessionError::InvalidPosition(PositionError::IllegalMove { .. })
    ));
    assert_eq!(s.ply(), 2);
    assert_eq!(
        s.board().position_key(),
        state_after(&["e2e4", "e7e5"]).position_key()
    );
}

#[test]
fn invalid_fen_resyncs_to_start() {
    let mut s = session(SearchConfig::for_testing());
    play(&mut s, &["e2e4"]);

    let err = s
        .position(&PositionSpec::startpos().with_fen("not a fen").with_moves(["e2e4"]))
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::InvalidPosition(PositionError::InvalidFen { .. })
    ));
    assert_eq!(s.ply(), 0);
    assert_eq!(
        s.board().position_key(),
        ChessState::start_position().position_key()
    );
}

#[test]
fn repeated_position_sets_flag() {
    let mut s = session(SearchConfig::for_testing());
    play(&mut s, &["g1f3", "g8f6", "f3g1"]);
    assert!(!s.check_repetition());

    play(&mut s, &["f6g8"]);
    assert!(s.check_repetition());

    s.new_game();
    assert!(!s.check_repetition());
}

#[test]
fn irreversible_move_forgets_history() {
    let mut s = session(SearchConfig::for_testing());
    // the knights return after the pawn moves, but no earlier position can recur
    play(&mut s, &["g1f3", "g8f6", "e2e4", "f6g8", "f3g1", "g8f6"]);
    assert!(!s.check_repetition());
}

#[test]
fn search_plays_a_legal_move() {
    let config = SearchConfig::for_testing();
    let iterations = config.iterations;
    let mut s = session(config);

    let before = s.board().clone();
    let result = s.search().unwrap();

    assert!(before.legal_moves().contains(&result.best_move));
    assert_eq!(result.stats.simulations, iterations);
    assert_eq!(s.ply(), 1);
    assert_eq!(s.board().turn(), Player::Black);
}

#[test]
fn search_refuses_finished_game() {
    let mut s = session(SearchConfig::for_testing());
    s.position(&PositionSpec::startpos().with_moves(["f2f3", "e7e5", "g2g4", "d8h4"]))
        .unwrap();
    assert!(matches!(
        s.search(),
        Err(SessionError::Search(mcts::SearchError::GameOver))
    ));
}

#[test]
fn equal_priorities_pick_first_child() {
    let config = SearchConfig::for_testing()
        .with_iterations(3)
        .with_exploration(0.0);
    let mut s = session(config);
    s.run_simulations().unwrap();

    let tree = s.tree();
    let visits: Vec<u32> = tree
        .children(tree.root())
        .iter()
        .map(|(_, id)| tree.get(*id).visits)
        .collect();
    assert_eq!(visits[0], 2);
    assert!(visits[1..].iter().all(|&n| n == 0));
}

#[test]
fn value_is_reported_per_player() {
    let mut s = session(SearchConfig::for_testing());
    assert_eq!(s.value(Player::White), 0.0);

    s.run_simulations().unwrap();
    let root = s.tree().root_node().mean_value();
    assert!((s.value(Player::White) - root).abs() < 1e-12);
    assert!((s.value(Player::White) + s.value(Player::Black)).abs() < 1e-12);
}

#[test]
fn proven_mate_is_played_and_reported() {
    let config = SearchConfig::for_testing()
        .with_iterations(100)
        .with_backprop_win_loss(true)
        .with_take_or_avoid_knowns(true);
    let mut s = session(config);
    s.position(&PositionSpec::startpos().with_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1"))
        .unwrap();

    let result = s.search().unwrap();
    assert_eq!(result.best_move.to_string(), "a1a8");
    assert!(s.board().is_over());
    assert!((s.value(Player::White) - 1.0).abs() < 1e-12);
}

#[test]
fn seeded_sessions_are_reproducible() {
    let config = SearchConfig::for_testing()
        .with_temperature(1.0)
        .with_seed(Some(11));
    let mut a = session(config.clone());
    let mut b = session(config);
    for _ in 0..3 {
        let ma = a.search().unwrap().best_move;
        let mb = b.search().unwrap().best_move;
        assert_eq!(ma, mb);
    }
}
