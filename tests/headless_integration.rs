use std::sync::mpsc;
use std::time::Duration;

use chatterbox::app::{App, ExitType};
use chatterbox::clock::{Clock, ManualClock};
use chatterbox::engine::{Input, Phase};
use chatterbox::host::{AssignmentContext, GameHost, HostView};
use chatterbox::runtime::{FixedTicker, PlayEvent, Runner, TestEventSource};
use chatterbox::store::{MemoryStore, PersistenceService, SqliteStore};
use chatterbox::variant::{Family, GameVariant};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde_json::json;

fn key(c: char) -> PlayEvent {
    PlayEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

/// One correct move for whatever the game is waiting on.
fn play_well<S: PersistenceService>(host: &mut GameHost<S, ManualClock>, clock: &ManualClock) {
    let Some(game) = host.game() else {
        return;
    };
    if game.phase() != Phase::AwaitingResponse {
        return;
    }
    match game.variant().family() {
        Family::Choice => {
            let target = game.current_round().unwrap().target.clone();
            host.handle_input(Input::Choose(target));
        }
        Family::Matching => {
            let board = game.board().unwrap();
            let n = board.cards().len();
            let (a, b) = (0..n)
                .filter(|i| !board.is_matched(*i))
                .find_map(|i| (0..n).find(|j| board.is_match(i, *j)).map(|j| (i, j)))
                .unwrap();
            host.handle_input(Input::Flip(a));
            host.handle_input(Input::Flip(b));
        }
        Family::SelfPaced => {
            host.handle_input(Input::Done);
        }
        Family::Recording => {
            host.handle_input(Input::StartRecording);
            clock.advance_secs(50);
            host.handle_input(Input::Done);
        }
    }
}

fn play_to_summary<S: PersistenceService>(host: &mut GameHost<S, ManualClock>, clock: &ManualClock) {
    for _ in 0..500 {
        if matches!(host.view(), HostView::Summary(_)) {
            return;
        }
        play_well(host, clock);
        clock.advance_ms(1500);
        host.on_tick();
    }
    panic!("session never finished");
}

#[test]
fn every_game_completes_with_full_marks_when_played_well() {
    for variant in GameVariant::ALL {
        for difficulty in 1..=3 {
            let clock = ManualClock::new();
            let ctx = AssignmentContext::new("p1", "Robin", variant).with_difficulty(difficulty);
            let mut host = GameHost::with_seed(ctx, MemoryStore::new(), clock.clone(), 11);
            host.start().unwrap();
            play_to_summary(&mut host, &clock);

            let HostView::Summary(result) = host.view().clone() else {
                unreachable!()
            };
            assert_eq!(result.items_completed, result.items_total, "{variant}");
            assert_eq!(result.accuracy, 100, "{variant}");
            assert_eq!(result.stars_earned, 3, "{variant}");
            assert!(result.mistakes.is_empty(), "{variant}");
            assert_eq!(host.store().sessions().len(), 1, "{variant}");
            assert_eq!(host.store().patient("p1").unwrap().total_stars, 3);
        }
    }
}

#[test]
fn headless_keys_through_runner_reach_summary() {
    let clock = ManualClock::new();
    let config = json!({
        "pairs": [
            {"target": "ship", "foil": "sip"},
            {"target": "fan", "foil": "van"}
        ]
    });
    let ctx = AssignmentContext::new("p1", "Robin", GameVariant::Discrimination).with_config(config);
    let host = GameHost::with_seed(ctx, MemoryStore::new(), clock.clone(), 2);
    let mut app = App::new(host);
    app.start();

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );

    for _ in 0..100u32 {
        if let Some(game) = app.host.game() {
            if game.phase() == Phase::AwaitingResponse {
                let round = game.current_round().unwrap();
                let idx = round.choices.iter().position(|c| *c == round.target).unwrap();
                tx.send(key(char::from(b'1' + idx as u8))).unwrap();
            }
        }
        match runner.step() {
            PlayEvent::Tick => {
                clock.advance_ms(700);
                app.on_tick();
            }
            PlayEvent::Resize => {}
            PlayEvent::Key(k) => {
                assert_eq!(app.on_key(k), ExitType::Continue);
            }
        }
        if matches!(app.host.view(), HostView::Summary(_)) {
            break;
        }
    }

    let HostView::Summary(result) = app.host.view().clone() else {
        panic!("expected summary");
    };
    assert_eq!(result.items_total, 2);
    assert_eq!(result.score, 2);
    assert_eq!(result.stars_earned, 3);
}

#[test]
fn results_land_in_sqlite_with_assignment() {
    let clock = ManualClock::new();
    let ctx = AssignmentContext::new("p7", "Kit", GameVariant::SyllableCount).with_assignment("as-3");
    let store = SqliteStore::open_in_memory().unwrap();
    let mut host = GameHost::with_seed(ctx, store, clock.clone(), 4);
    host.start().unwrap();
    play_to_summary(&mut host, &clock);
    host.play_again().unwrap();
    play_to_summary(&mut host, &clock);

    let sessions = host.store().recent_sessions("p7", 10).unwrap();
    assert_eq!(sessions.len(), 2);
    assert!(sessions.iter().all(|s| s.game_id == "syllable-count"));
    assert_eq!(sessions[0].assignment_id.as_deref(), Some("as-3"));

    let stats = host.store().patient_stats("p7").unwrap().unwrap();
    assert_eq!(stats.total_stars, 6);
    assert_eq!(stats.sessions_played, 2);
    assert_eq!(stats.last_played_at, Some(clock.wall()));
}

#[test]
fn wrong_answers_are_reported_as_mistakes() {
    let clock = ManualClock::new();
    let config = json!({"pairs": [{"target": "ship", "foil": "sip"}]});
    let ctx = AssignmentContext::new("p1", "Robin", GameVariant::Discrimination).with_config(config);
    let mut host = GameHost::with_seed(ctx, MemoryStore::new(), clock.clone(), 9);
    host.start().unwrap();
    host.handle_input(Input::Choose("sip".into()));
    clock.advance_secs(2);
    let result = host.on_tick().completed().cloned().unwrap();
    assert_eq!(result.accuracy, 0);
    assert_eq!(result.stars_earned, 0);
    assert_eq!(result.mistakes.len(), 1);
    assert_eq!(result.mistakes[0].expected, "ship");
    assert_eq!(result.mistakes[0].got, "sip");
}

#[test]
fn leaving_mid_session_saves_nothing() {
    let clock = ManualClock::new();
    let ctx = AssignmentContext::new("p1", "Robin", GameVariant::Mimicry);
    let mut host = GameHost::with_seed(ctx, MemoryStore::new(), clock.clone(), 9);
    host.start().unwrap();
    host.handle_input(Input::Done);
    host.go_back();
    clock.advance_secs(60);
    assert!(host.on_tick().is_ignored());
    assert!(host.store().sessions().is_empty());
    assert_eq!(host.view(), &HostView::Idle);
}

#[test]
fn malformed_config_plays_built_in_content() {
    let clock = ManualClock::new();
    let ctx = AssignmentContext::new("p1", "Robin", GameVariant::TongueTwister)
        .with_config(json!({"twisters": "not a list"}));
    let mut host = GameHost::with_seed(ctx, MemoryStore::new(), clock.clone(), 1);
    host.start().unwrap();
    play_to_summary(&mut host, &clock);
    assert_eq!(host.store().sessions().len(), 1);
}
