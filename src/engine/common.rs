use std::time::Duration;
use tracing::{debug, info};

use super::emitter::{Grading, ResultEmitter};
use super::timer::{Scheduler, TimerKind};
use super::{Feedback, Phase, Step};
use crate::content::{Content, Round, Timing};
use crate::error::EngineError;
use crate::session::{SessionResult, SessionState};
use crate::variant::GameVariant;

/// Bookkeeping every state machine shares: rounds, phase, timers, the
/// emitter and the teardown guard.
#[derive(Debug)]
pub(super) struct SessionCore {
    pub variant: GameVariant,
    pub rounds: Vec<Round>,
    pub timing: Timing,
    pub state: SessionState,
    pub timers: Scheduler,
    pub feedback: Option<Feedback>,
    emitter: ResultEmitter,
    result: Option<SessionResult>,
    torn_down: bool,
}

impl SessionCore {
    pub fn new(content: Content, items_total: usize, now: Duration) -> Result<Self, EngineError> {
        if content.is_empty() || items_total == 0 {
            return Err(EngineError::NoContent(content.variant));
        }
        debug!(game = %content.variant, items = items_total, "session started");
        Ok(Self {
            variant: content.variant,
            rounds: content.rounds,
            timing: content.timing,
            state: SessionState::new(items_total, now, Phase::AwaitingResponse),
            timers: Scheduler::new(),
            feedback: None,
            emitter: ResultEmitter::new(),
            result: None,
            torn_down: false,
        })
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn accepts_input(&self) -> bool {
        !self.torn_down && self.state.phase == Phase::AwaitingResponse
    }

    pub fn current_round(&self) -> Option<&Round> {
        if self.state.phase == Phase::Complete {
            return None;
        }
        self.rounds.get(self.state.round_index)
    }

    /// Starts round `index`: timed variants present the stimulus first.
    pub fn enter_round(&mut self, index: usize, now: Duration) {
        self.state.round_index = index;
        self.feedback = None;
        match self.timing.display {
            Some(display) => {
                self.state.phase = Phase::Presenting;
                self.timers.schedule(now + display, TimerKind::Reveal);
            }
            None => self.state.phase = Phase::AwaitingResponse,
        }
    }

    pub fn enter_feedback(&mut self, feedback: Feedback, now: Duration) {
        self.feedback = Some(feedback);
        self.state.phase = Phase::Feedback;
        self.timers
            .schedule(now + self.timing.feedback, TimerKind::Advance);
    }

    /// Timers due at `now`; nothing once torn down or complete.
    pub fn due(&mut self, now: Duration) -> Vec<(TimerKind, Duration)> {
        if self.torn_down || self.state.phase == Phase::Complete {
            return Vec::new();
        }
        self.timers.take_due(now)
    }

    /// Moves past the feedback of the current round.
    pub fn advance(&mut self, grading: impl FnOnce(&SessionState) -> Grading, now: Duration) -> Step {
        if self.state.phase != Phase::Feedback {
            return Step::Ignored;
        }
        if self.state.all_items_completed() {
            let grading = grading(&self.state);
            self.finish(grading, now)
        } else {
            let next = self.state.round_index + 1;
            self.enter_round(next, now);
            Step::Updated
        }
    }

    /// Enters `Complete` and emits the result. Only the first call has effect.
    pub fn finish(&mut self, grading: Grading, now: Duration) -> Step {
        if self.state.phase == Phase::Complete || self.torn_down {
            return Step::Ignored;
        }
        let Some(result) = self.emitter.emit(self.variant, &self.state, grading, now) else {
            return Step::Ignored;
        };
        self.state.phase = Phase::Complete;
        self.feedback = None;
        self.timers.close();
        info!(
            game = %self.variant,
            score = result.score,
            accuracy = result.accuracy,
            stars = result.stars_earned,
            "session complete"
        );
        self.result = Some(result.clone());
        Step::Completed(result)
    }

    pub fn teardown(&mut self) {
        if !self.torn_down {
            debug!(game = %self.variant, phase = %self.state.phase, "session torn down");
        }
        self.torn_down = true;
        self.timers.close();
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }
}

/// Folds several step outcomes from one tick into the most significant.
pub(super) fn merge(acc: Step, next: Step) -> Step {
    match (acc, next) {
        (done @ Step::Completed(_), _) | (_, done @ Step::Completed(_)) => done,
        (Step::Updated, _) | (_, Step::Updated) => Step::Updated,
        _ => Step::Ignored,
    }
}
