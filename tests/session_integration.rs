//! Integration tests for the session state machine
//!
//! These tests cover the scoring math and the level lifecycle:
//! - Target and progress formulas
//! - The IDLE -> PLAYING -> LEVEL_CLEARED cycle across multiple levels
//! - Stale-fetch discard when levels advance with a load in flight

use chaos_city::core::config;
use chaos_city::layout::generator::generate;
use chaos_city::session::{GameStatus, Session, SessionEvent};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn start_level(session: &mut Session, rng: &mut ChaCha8Rng) {
    let request = session.begin_level();
    let layout = generate(request.level, rng);
    assert!(session.install_layout(request.token, layout));
}

#[test]
fn test_target_formula_across_levels() {
    let base = config().level_target_base;
    assert_eq!(base, 2000);

    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut session = Session::new();
    start_level(&mut session, &mut rng);

    for expected_level in 1..=5u64 {
        assert_eq!(session.state().level as u64, expected_level);
        assert_eq!(session.target_score(), expected_level * base);
        // Clear the level to move on.
        session.on_score_event(session.target_score());
        let request = session.advance_level();
        let layout = generate(request.level, &mut rng);
        session.install_layout(request.token, layout);
    }
}

#[test]
fn test_progress_sequence_exact() {
    // Level 1, target 2000: 0 -> 1500 -> 2100.
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let mut session = Session::new();
    start_level(&mut session, &mut rng);

    let first = session.on_score_event(1500).expect("playing");
    assert_eq!(
        first,
        SessionEvent::Progress {
            chaos_score: 1500,
            chaos_level: 75.0
        }
    );
    assert_eq!(session.state().game_status, GameStatus::Playing);
    assert!(session.state().is_level_active);

    let second = session.on_score_event(600).expect("playing");
    assert_eq!(
        second,
        SessionEvent::LevelCleared {
            level: 1,
            chaos_score: 2100
        }
    );
    assert_eq!(session.state().chaos_level, 100.0);
    assert!(!session.state().is_level_active);
}

#[test]
fn test_full_cycle_resets_score_each_level() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut session = Session::new();
    start_level(&mut session, &mut rng);

    for _ in 0..3 {
        let target = session.target_score();
        session.on_score_event(target + 123);
        assert_eq!(session.state().game_status, GameStatus::LevelCleared);

        let request = session.advance_level();
        let layout = generate(request.level, &mut rng);
        session.install_layout(request.token, layout);
        assert_eq!(session.state().chaos_score, 0);
        assert_eq!(session.state().chaos_level, 0.0);
        assert_eq!(session.state().game_status, GameStatus::Playing);
    }
    assert_eq!(session.state().level, 4);
}

#[test]
fn test_advance_from_level_three_discards_inflight_fetch() {
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let mut session = Session::starting_at(3);

    // A fetch for level 3 goes out...
    let inflight = session.begin_level();
    let stale_layout = generate(inflight.level, &mut rng);

    // ...but the player advances before it lands.
    let fresh = session.advance_level();
    assert_eq!(fresh.level, 4);
    assert_eq!(session.state().level, 4);

    // The stale result must not populate the new level.
    assert!(!session.install_layout(inflight.token, stale_layout));
    assert!(session.layout().is_none());
    assert_eq!(session.state().game_status, GameStatus::Idle);

    // The fresh result does.
    let layout = generate(fresh.level, &mut rng);
    assert!(session.install_layout(fresh.token, layout));
    assert_eq!(session.state().game_status, GameStatus::Playing);
}

#[test]
fn test_levels_are_unbounded() {
    // No terminal state: the cycle continues arbitrarily far.
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let mut session = Session::new();
    start_level(&mut session, &mut rng);

    for _ in 0..20 {
        session.on_score_event(session.target_score());
        let request = session.advance_level();
        let layout = generate(request.level, &mut rng);
        session.install_layout(request.token, layout);
    }
    assert_eq!(session.state().level, 21);
    assert_eq!(session.state().game_status, GameStatus::Playing);
}
