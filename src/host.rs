//! Session lifecycle for one assignment.
//!
//! The host resolves content, builds the state machine, forwards inputs and
//! ticks to it, and when a result comes out, persists it and flips to the
//! summary view. Persistence failures never block the summary.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::content::{self, Difficulty, SeedSequence};
use crate::engine::{self, Game, Input, Step};
use crate::error::EngineError;
use crate::session::SessionResult;
use crate::store::PersistenceService;
use crate::variant::{Family, GameVariant};

/// Everything the host needs to know about what to play and for whom.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentContext {
    pub patient_id: String,
    pub patient_display_name: String,
    pub variant: GameVariant,
    pub config: Value,
    pub difficulty: i64,
    pub assignment_id: Option<String>,
}

impl AssignmentContext {
    pub fn new(
        patient_id: impl Into<String>,
        patient_display_name: impl Into<String>,
        variant: GameVariant,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            patient_display_name: patient_display_name.into(),
            variant,
            config: Value::Null,
            difficulty: 1,
            assignment_id: None,
        }
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    pub fn with_difficulty(mut self, difficulty: i64) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_assignment(mut self, assignment_id: impl Into<String>) -> Self {
        self.assignment_id = Some(assignment_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostView {
    Idle,
    Playing,
    Summary(SessionResult),
}

/// Non-fatal problems surfaced to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    SaveFailed(String),
}

type CompletionListener = Box<dyn FnMut(&SessionResult)>;

pub struct GameHost<S: PersistenceService, C: Clock> {
    context: AssignmentContext,
    store: S,
    clock: C,
    rng: StdRng,
    seeds: SeedSequence,
    game: Option<Box<dyn Game>>,
    view: HostView,
    notices: Vec<Notice>,
    save_results: bool,
    started_at: Option<DateTime<Utc>>,
    listener: Option<CompletionListener>,
}

impl<S: PersistenceService, C: Clock> GameHost<S, C> {
    pub fn new(context: AssignmentContext, store: S, clock: C) -> Self {
        Self::with_rng(context, store, clock, StdRng::from_entropy())
    }

    /// Seeds the host's seed sequence, making every session reproducible.
    pub fn with_seed(context: AssignmentContext, store: S, clock: C, seed: u64) -> Self {
        Self::with_rng(context, store, clock, StdRng::seed_from_u64(seed))
    }

    fn with_rng(context: AssignmentContext, store: S, clock: C, rng: StdRng) -> Self {
        Self {
            context,
            store,
            clock,
            rng,
            seeds: SeedSequence::new(),
            game: None,
            view: HostView::Idle,
            notices: Vec::new(),
            save_results: true,
            started_at: None,
            listener: None,
        }
    }

    /// Skip persistence entirely; results are still shown.
    pub fn without_saving(mut self) -> Self {
        self.save_results = false;
        self
    }

    /// Registers the listener fired once per finished session.
    pub fn on_complete(&mut self, listener: impl FnMut(&SessionResult) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Resolves fresh content and starts playing. Any running session is
    /// torn down first.
    pub fn start(&mut self) -> Result<(), EngineError> {
        self.discard_game();
        let seed = self.seeds.next_seed(&mut self.rng);
        let mut session_rng = StdRng::seed_from_u64(seed);
        let difficulty = Difficulty::new(self.context.difficulty);
        let content = content::resolve(
            self.context.variant,
            &self.context.config,
            difficulty,
            &mut session_rng,
        )?;
        let game = engine::build(content, &mut session_rng, self.clock.now())?;
        info!(
            patient = %self.context.patient_id,
            game = %self.context.variant,
            difficulty = difficulty.level(),
            seed,
            "game started"
        );
        self.game = Some(game);
        self.started_at = Some(self.clock.wall());
        self.view = HostView::Playing;
        Ok(())
    }

    /// Timers already due fire before the input lands, so a feedback window
    /// that has run out never swallows the next answer.
    pub fn handle_input(&mut self, input: Input) -> Step {
        if let Some(done) = self.catch_up() {
            return done;
        }
        let now = self.clock.now();
        let Some(game) = self.playing_game() else {
            return Step::Ignored;
        };
        let step = game.handle(input, now);
        self.absorb(step)
    }

    /// Picks the `idx`-th visible option: an answer for choice games, a card
    /// for matching games.
    pub fn choose_index(&mut self, idx: usize) -> Step {
        if let Some(done) = self.catch_up() {
            return done;
        }
        let Some(game) = self.game.as_deref() else {
            return Step::Ignored;
        };
        let input = match game.variant().family() {
            Family::Matching => Input::Flip(idx),
            Family::Choice => match game.current_round().and_then(|r| r.choices.get(idx)) {
                Some(choice) => Input::Choose(choice.clone()),
                None => return Step::Ignored,
            },
            Family::SelfPaced | Family::Recording => return Step::Ignored,
        };
        self.handle_input(input)
    }

    pub fn on_tick(&mut self) -> Step {
        let now = self.clock.now();
        let Some(game) = self.playing_game() else {
            return Step::Ignored;
        };
        let step = fire_due(&mut **game, now);
        self.absorb(step)
    }

    /// Throws the finished (or abandoned) session away and starts a new one
    /// with a different seed.
    pub fn play_again(&mut self) -> Result<(), EngineError> {
        debug!(game = %self.context.variant, "play again");
        self.start()
    }

    /// Tears the session down and returns to the idle screen.
    pub fn go_back(&mut self) {
        self.discard_game();
        self.view = HostView::Idle;
    }

    pub fn view(&self) -> &HostView {
        &self.view
    }

    pub fn game(&self) -> Option<&dyn Game> {
        self.game.as_deref()
    }

    pub fn context(&self) -> &AssignmentContext {
        &self.context
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Wall-clock start of the current session.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn last_seed(&self) -> Option<u64> {
        self.seeds.last()
    }

    fn playing_game(&mut self) -> Option<&mut Box<dyn Game>> {
        if self.view != HostView::Playing {
            return None;
        }
        self.game.as_mut()
    }

    /// Fires due timers; `Some` only when that finished the session.
    fn catch_up(&mut self) -> Option<Step> {
        let now = self.clock.now();
        let game = self.playing_game()?;
        match fire_due(&mut **game, now) {
            done @ Step::Completed(_) => Some(self.absorb(done)),
            _ => None,
        }
    }

    fn discard_game(&mut self) {
        if let Some(mut game) = self.game.take() {
            game.teardown();
        }
    }

    fn absorb(&mut self, step: Step) -> Step {
        if let Step::Completed(result) = &step {
            self.complete(result.clone());
        }
        step
    }

    fn complete(&mut self, result: SessionResult) {
        if self.save_results {
            self.persist(&result);
        }
        self.view = HostView::Summary(result.clone());
        if let Some(listener) = self.listener.as_mut() {
            listener(&result);
        }
    }

    /// Records the session and credits the stars; one failing write never
    /// stops the other.
    fn persist(&mut self, result: &SessionResult) {
        let ctx = &self.context;
        let game_id = ctx.variant.game_id();
        let played_at = self.clock.wall();
        if let Err(e) = self.store.record_session(
            &ctx.patient_id,
            &game_id,
            ctx.assignment_id.as_deref(),
            result,
            played_at,
        ) {
            warn!(patient = %ctx.patient_id, game = %game_id, error = %e, "failed to record session");
            self.notices.push(Notice::SaveFailed(e.to_string()));
        }
        if let Err(e) =
            self.store
                .increment_patient_stars(&ctx.patient_id, result.stars_earned, played_at)
        {
            warn!(patient = %ctx.patient_id, error = %e, "failed to update patient stars");
            self.notices.push(Notice::SaveFailed(e.to_string()));
        }
    }
}

/// Ticks until nothing more is due at `now`. A timer fired late can schedule
/// the next one in the past (advance, then reveal), hence the loop.
fn fire_due(game: &mut dyn Game, now: Duration) -> Step {
    let mut step = Step::Ignored;
    loop {
        match game.on_tick(now) {
            Step::Ignored => return step,
            Step::Updated => step = Step::Updated,
            done @ Step::Completed(_) => return done,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::engine::Phase;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn host(variant: GameVariant, store: MemoryStore) -> (GameHost<MemoryStore, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let ctx = AssignmentContext::new("p1", "Robin", variant).with_assignment("a1");
        (GameHost::with_seed(ctx, store, clock.clone(), 7), clock)
    }

    /// Answers every round correctly, advancing the clock past each feedback.
    fn play_perfect(host: &mut GameHost<MemoryStore, ManualClock>, clock: &ManualClock) -> Step {
        loop {
            let target = host.game().unwrap().current_round().unwrap().target.clone();
            clock.advance_ms(1000);
            assert_eq!(host.handle_input(Input::Choose(target)), Step::Updated);
            clock.advance_ms(1500);
            let step = host.on_tick();
            if step.completed().is_some() {
                return step;
            }
        }
    }

    #[test]
    fn starts_idle_then_plays() {
        let (mut host, _) = host(GameVariant::PronounQuiz, MemoryStore::new());
        assert_eq!(host.view(), &HostView::Idle);
        assert_eq!(host.handle_input(Input::Done), Step::Ignored);
        host.start().unwrap();
        assert_eq!(host.view(), &HostView::Playing);
        assert!(host.started_at().is_some());
        assert_eq!(host.game().unwrap().phase(), Phase::AwaitingResponse);
    }

    #[test]
    fn completion_records_then_credits_stars() {
        let (mut host, clock) = host(GameVariant::PronounQuiz, MemoryStore::new());
        let fired = Rc::new(RefCell::new(Vec::new()));
        let sink = fired.clone();
        host.on_complete(move |r| sink.borrow_mut().push(r.clone()));
        host.start().unwrap();

        let result = play_perfect(&mut host, &clock).completed().cloned().unwrap();
        assert_eq!(host.view(), &HostView::Summary(result.clone()));
        assert_eq!(fired.borrow().len(), 1);

        let store = host.store();
        assert_eq!(store.sessions().len(), 1);
        assert_eq!(store.sessions()[0].game_id, "pronoun-quiz");
        assert_eq!(store.sessions()[0].assignment_id.as_deref(), Some("a1"));
        assert_eq!(store.patient("p1").unwrap().total_stars, 3);

        clock.advance_secs(30);
        assert_eq!(host.on_tick(), Step::Ignored);
        assert_eq!(fired.borrow().len(), 1);
    }

    #[test]
    fn failed_record_still_credits_stars() {
        let mut store = MemoryStore::new();
        store.fail_record(true);
        let (mut host, clock) = host(GameVariant::PronounQuiz, store);
        host.start().unwrap();
        play_perfect(&mut host, &clock);
        assert!(matches!(host.view(), HostView::Summary(_)));
        assert!(matches!(host.notices(), [Notice::SaveFailed(_)]));
        assert!(host.store().sessions().is_empty());
        assert_eq!(host.store().patient("p1").unwrap().total_stars, 3);
    }

    #[test]
    fn both_writes_failing_leaves_two_notices() {
        let (mut host, clock) = host(GameVariant::PronounQuiz, MemoryStore::unavailable());
        host.start().unwrap();
        play_perfect(&mut host, &clock);
        assert!(matches!(host.view(), HostView::Summary(_)));
        assert_eq!(host.notices().len(), 2);
    }

    #[test]
    fn session_and_stars_share_the_clock_time() {
        let (mut host, clock) = host(GameVariant::FirstSound, MemoryStore::new());
        host.start().unwrap();
        play_perfect(&mut host, &clock);
        let stamped = host.store().sessions()[0].played_at;
        assert_eq!(stamped, clock.wall());
        assert_eq!(host.store().patient("p1").unwrap().last_played_at, Some(stamped));
    }

    #[test]
    fn answer_after_feedback_ran_out_lands_without_a_tick() {
        let (mut host, clock) = host(GameVariant::PronounQuiz, MemoryStore::new());
        host.start().unwrap();
        let first = host.game().unwrap().current_round().unwrap().target.clone();
        assert_eq!(host.handle_input(Input::Choose(first)), Step::Updated);
        assert_eq!(host.game().unwrap().phase(), Phase::Feedback);

        clock.advance_ms(5000);
        let game = host.game().unwrap();
        assert_eq!(game.phase(), Phase::Feedback);
        assert_eq!(game.state().round_index, 0);

        assert_eq!(host.handle_input(Input::Choose("they".into())), Step::Updated);
        let game = host.game().unwrap();
        assert_eq!(game.state().round_index, 1);
        assert_eq!(game.state().attempts.len(), 2);
        assert_eq!(game.phase(), Phase::Feedback);
    }

    #[test]
    fn choose_index_reads_the_round_that_is_due() {
        let (mut host, clock) = host(GameVariant::PronounQuiz, MemoryStore::new());
        host.start().unwrap();
        assert_eq!(host.choose_index(0), Step::Updated);
        clock.advance_ms(5000);
        assert_eq!(host.choose_index(0), Step::Updated);
        let game = host.game().unwrap();
        let second = game.current_round().unwrap();
        assert_eq!(game.state().round_index, 1);
        assert_eq!(game.state().attempts[1].choice, second.choices[0]);
    }

    #[test]
    fn late_tick_catches_up_on_every_due_timer() {
        let (mut host, clock) = host(GameVariant::FlashReading, MemoryStore::new());
        host.start().unwrap();
        clock.advance_secs(30);
        host.on_tick();
        assert_eq!(host.choose_index(0), Step::Updated);
        clock.advance_secs(30);
        assert_eq!(host.on_tick(), Step::Updated);
        let game = host.game().unwrap();
        assert_eq!(game.state().round_index, 1);
        assert_eq!(game.phase(), Phase::AwaitingResponse);
    }

    #[test]
    fn due_completion_wins_over_late_input() {
        let (mut host, clock) = host(GameVariant::PronounQuiz, MemoryStore::new());
        host.start().unwrap();
        loop {
            let target = host.game().unwrap().current_round().unwrap().target.clone();
            assert_eq!(host.handle_input(Input::Choose(target)), Step::Updated);
            if host.game().unwrap().state().all_items_completed() {
                break;
            }
            clock.advance_ms(1500);
            host.on_tick();
        }
        clock.advance_ms(5000);
        let step = host.handle_input(Input::Choose("they".into()));
        assert_eq!(step.completed().map(|r| r.stars_earned), Some(3));
        assert!(matches!(host.view(), HostView::Summary(_)));
        assert_eq!(host.store().sessions().len(), 1);
    }

    #[test]
    fn failed_star_update_is_reported() {
        let mut store = MemoryStore::new();
        store.fail_stars(true);
        let (mut host, clock) = host(GameVariant::FirstSound, store);
        host.start().unwrap();
        play_perfect(&mut host, &clock);
        assert_eq!(host.store().sessions().len(), 1);
        assert!(matches!(host.notices(), [Notice::SaveFailed(_)]));
    }

    #[test]
    fn without_saving_never_touches_store() {
        let (host, clock) = host(GameVariant::PronounQuiz, MemoryStore::unavailable());
        let mut host = host.without_saving();
        host.start().unwrap();
        play_perfect(&mut host, &clock);
        assert!(host.notices().is_empty());
        assert!(host.store().sessions().is_empty());
    }

    #[test]
    fn choose_index_maps_to_choice_or_card() {
        let (mut quiz, _) = host(GameVariant::PronounQuiz, MemoryStore::new());
        quiz.start().unwrap();
        assert_eq!(quiz.choose_index(0), Step::Updated);
        assert_eq!(quiz.game().unwrap().phase(), Phase::Feedback);

        let (mut cards, _) = host(GameVariant::MemoryMatch, MemoryStore::new());
        cards.start().unwrap();
        assert_eq!(cards.choose_index(0), Step::Updated);
        assert_eq!(cards.game().unwrap().board().unwrap().flipped(), &[0]);
        assert_eq!(cards.choose_index(500), Step::Ignored);
    }

    #[test]
    fn play_again_uses_a_new_seed() {
        let (mut host, _) = host(GameVariant::WordRecognition, MemoryStore::new());
        host.start().unwrap();
        let first = host.last_seed().unwrap();
        host.play_again().unwrap();
        let second = host.last_seed().unwrap();
        assert_ne!(first, second);
        assert_eq!(host.view(), &HostView::Playing);
        assert_eq!(host.game().unwrap().state().attempts.len(), 0);
    }

    #[test]
    fn go_back_tears_down() {
        let (mut host, clock) = host(GameVariant::PronounQuiz, MemoryStore::new());
        host.start().unwrap();
        host.choose_index(0);
        host.go_back();
        assert_eq!(host.view(), &HostView::Idle);
        assert!(host.game().is_none());
        clock.advance_secs(10);
        assert_eq!(host.on_tick(), Step::Ignored);
        assert!(host.store().sessions().is_empty());
    }

    #[test]
    fn empty_content_refuses_to_start() {
        let clock = ManualClock::new();
        let ctx = AssignmentContext::new("p1", "Robin", GameVariant::Mimicry)
            .with_config(json!({"prompts": []}));
        let mut host = GameHost::with_seed(ctx, MemoryStore::new(), clock, 1);
        assert!(matches!(host.start(), Err(EngineError::NoContent(GameVariant::Mimicry))));
        assert_eq!(host.view(), &HostView::Idle);
    }

    #[test]
    fn difficulty_is_clamped() {
        let clock = ManualClock::new();
        let ctx = AssignmentContext::new("p1", "Robin", GameVariant::MemoryMatch).with_difficulty(99);
        let mut host = GameHost::with_seed(ctx, MemoryStore::new(), clock, 1);
        host.start().unwrap();
        let board = host.game().unwrap().board().unwrap();
        assert_eq!(board.pair_count(), 6);
    }
}
