use std::time::Duration;

use super::common::{merge, SessionCore};
use super::emitter::Grading;
use super::timer::TimerKind;
use super::{Feedback, Game, Input, Phase, Step};
use crate::content::{Content, Round};
use crate::error::EngineError;
use crate::session::{SessionResult, SessionState};
use crate::variant::GameVariant;

/// Mimicry, stories and tongue twisters: the child says the prompt and taps
/// done. Every round counts as completed and the session earns full stars.
#[derive(Debug)]
pub struct SelfPacedGame {
    core: SessionCore,
}

impl SelfPacedGame {
    pub fn new(content: Content, now: Duration) -> Result<Self, EngineError> {
        let total = content.rounds.len();
        let mut core = SessionCore::new(content, total, now)?;
        core.enter_round(0, now);
        Ok(Self { core })
    }
}

impl Game for SelfPacedGame {
    fn variant(&self) -> GameVariant {
        self.core.variant
    }

    fn phase(&self) -> Phase {
        self.core.phase()
    }

    fn handle(&mut self, input: Input, now: Duration) -> Step {
        if !self.core.accepts_input() || input != Input::Done {
            return Step::Ignored;
        }
        let Some(said) = self.core.current_round().map(|r| r.target.clone()) else {
            return Step::Ignored;
        };
        self.core.state.record_attempt(&said, true, now);
        self.core.state.complete_item(now);
        self.core.enter_feedback(Feedback::Done, now);
        Step::Updated
    }

    fn on_tick(&mut self, now: Duration) -> Step {
        let mut step = Step::Ignored;
        for (kind, deadline) in self.core.due(now) {
            if kind == TimerKind::Advance {
                step = merge(step, self.core.advance(|_| Grading::Completion, deadline));
            }
        }
        step
    }

    fn teardown(&mut self) {
        self.core.teardown();
    }

    fn is_torn_down(&self) -> bool {
        self.core.is_torn_down()
    }

    fn state(&self) -> &SessionState {
        &self.core.state
    }

    fn current_round(&self) -> Option<&Round> {
        self.core.current_round()
    }

    fn feedback(&self) -> Option<&Feedback> {
        self.core.feedback.as_ref()
    }

    fn result(&self) -> Option<&SessionResult> {
        self.core.result()
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.core.timers.next_deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Difficulty, Timing};

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn twisters(n: usize) -> SelfPacedGame {
        let content = Content {
            variant: GameVariant::TongueTwister,
            difficulty: Difficulty::default(),
            rounds: (0..n).map(|i| Round::new(format!("twister {i}"))).collect(),
            timing: Timing::for_variant(GameVariant::TongueTwister),
        };
        SelfPacedGame::new(content, Duration::ZERO).unwrap()
    }

    #[test]
    fn every_round_completes_with_full_stars() {
        let mut game = twisters(3);
        let mut now = Duration::ZERO;
        let mut result = None;
        for _ in 0..3 {
            now += ms(2000);
            assert_eq!(game.handle(Input::Done, now), Step::Updated);
            now += ms(600);
            if let Step::Completed(r) = game.on_tick(now) {
                result = Some(r);
            }
        }
        let result = result.unwrap();
        assert_eq!(result.stars_earned, 3);
        assert_eq!(result.accuracy, 100);
        assert_eq!(result.score, 30);
        assert_eq!(result.items_completed, 3);
        assert!(result.mistakes.is_empty());
        assert_eq!(result.duration_seconds, 7);
    }

    #[test]
    fn repeated_done_is_ignored_during_feedback() {
        let mut game = twisters(2);
        assert_eq!(game.handle(Input::Done, ms(10)), Step::Updated);
        assert_eq!(game.handle(Input::Done, ms(11)), Step::Ignored);
        assert_eq!(game.state().items_completed, 1);
        assert_eq!(game.feedback(), Some(&Feedback::Done));
    }

    #[test]
    fn choices_are_not_accepted() {
        let mut game = twisters(1);
        assert_eq!(game.handle(Input::Choose("twister 0".into()), ms(1)), Step::Ignored);
        assert_eq!(game.phase(), Phase::AwaitingResponse);
    }
}
