use std::time::Duration;
use tracing::debug;

use super::common::{merge, SessionCore};
use super::emitter::Grading;
use super::timer::TimerKind;
use super::{Feedback, Game, Input, Phase, Step};
use crate::content::{Content, Round};
use crate::error::EngineError;
use crate::session::{SessionResult, SessionState};
use crate::variant::GameVariant;

const DEFAULT_LIMIT: Duration = Duration::from_secs(120);

/// Free speech: the child records themselves talking about a prompt. Stars
/// come from how long they kept going, capped at the recording limit.
#[derive(Debug)]
pub struct NarrationGame {
    core: SessionCore,
    limit: Duration,
    recording_since: Option<Duration>,
    recorded: Duration,
}

impl NarrationGame {
    pub fn new(content: Content, now: Duration) -> Result<Self, EngineError> {
        let limit = content.timing.max_recording.unwrap_or(DEFAULT_LIMIT);
        let total = content.rounds.len();
        let mut core = SessionCore::new(content, total, now)?;
        core.enter_round(0, now);
        Ok(Self {
            core,
            limit,
            recording_since: None,
            recorded: Duration::ZERO,
        })
    }

    pub fn is_recording(&self) -> bool {
        self.recording_since.is_some()
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    fn start(&mut self, now: Duration) -> Step {
        if self.recording_since.is_some() {
            return Step::Ignored;
        }
        self.recording_since = Some(now);
        self.core
            .timers
            .schedule(now + self.limit, TimerKind::RecordingLimit);
        debug!(limit_secs = self.limit.as_secs(), "recording started");
        Step::Updated
    }

    fn stop(&mut self, now: Duration) -> Step {
        let Some(since) = self.recording_since.take() else {
            return Step::Ignored;
        };
        self.core.timers.cancel_kind(TimerKind::RecordingLimit);
        let take = now.saturating_sub(since).min(self.limit);
        self.recorded += take;

        let prompt = self
            .core
            .current_round()
            .map(|r| r.item().to_string())
            .unwrap_or_default();
        self.core.state.record_attempt(&prompt, true, now);
        self.core.state.complete_item(now);
        self.core.enter_feedback(Feedback::Done, now);
        debug!(secs = take.as_secs(), "recording stopped");
        Step::Updated
    }
}

impl Game for NarrationGame {
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
            Input::StartRecording => self.start(now),
            Input::Done => self.stop(now),
            _ => Step::Ignored,
        }
    }

    fn on_tick(&mut self, now: Duration) -> Step {
        let mut step = Step::Ignored;
        for (kind, deadline) in self.core.due(now) {
            let next = match kind {
                TimerKind::RecordingLimit => self.stop(deadline),
                TimerKind::Advance => {
                    let secs = self.recorded.as_secs();
                    self.core.advance(|_| Grading::Recording { secs }, deadline)
                }
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

    fn recorded_secs(&self, now: Duration) -> Option<u64> {
        let live = self
            .recording_since
            .map(|since| now.saturating_sub(since).min(self.limit))
            .unwrap_or_default();
        Some((self.recorded + live).as_secs())
    }
}
