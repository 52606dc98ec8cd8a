use std::time::Duration;

use super::common::{merge, SessionCore};
use super::emitter::Grading;
use super::timer::TimerKind;
use super::{Feedback, Game, Input, Phase, Step};
use crate::content::{Content, Round};
use crate::error::EngineError;
use crate::session::{SessionResult, SessionState};
use crate::variant::GameVariant;

/// Binary and multiple-choice games: one answer per round, correct when it
/// equals the round's target. Rounds advance strictly one at a time.
#[derive(Debug)]
pub struct ChoiceGame {
    core: SessionCore,
}

impl ChoiceGame {
    pub fn new(content: Content, now: Duration) -> Result<Self, EngineError> {
        let total = content.rounds.len();
        let mut core = SessionCore::new(content, total, now)?;
        core.enter_round(0, now);
        Ok(Self { core })
    }

    fn choose(&mut self, choice: &str, now: Duration) -> Step {
        let Some(round) = self.core.current_round() else {
            return Step::Ignored;
        };
        let correct = round.target == choice;
        let item = round.item().to_string();
        let expected = round.target.clone();

        let state = &mut self.core.state;
        state.record_attempt(choice, correct, now);
        if !correct {
            state.record_mistake(&item, &expected, choice);
        }
        state.complete_item(now);

        let feedback = if correct {
            Feedback::Correct
        } else {
            Feedback::Incorrect { expected }
        };
        self.core.enter_feedback(feedback, now);
        Step::Updated
    }
}

impl Game for ChoiceGame {
    fn variant(&self) -> GameVariant {
        self.core.variant
    }

    fn phase(&self) -> Phase {
        self.core.phase()
    }

    fn handle(&mut self, input: Input, now: Duration) -> Step {
        if !self.core.accepts_input() {
            return Step::Ignored;
        }
        match input {
            Input::Choose(choice) => self.choose(&choice, now),
            _ => Step::Ignored,
        }
    }

    fn on_tick(&mut self, now: Duration) -> Step {
        let mut step = Step::Ignored;
        for (kind, deadline) in self.core.due(now) {
            let next = match kind {
                TimerKind::Reveal if self.core.phase() == Phase::Presenting => {
                    self.core.state.phase = Phase::AwaitingResponse;
                    Step::Updated
                }
                TimerKind::Advance => self.core.advance(|_| Grading::Choice, deadline),
                _ => Step::Ignored,
            };
            step = merge(step, next);
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
