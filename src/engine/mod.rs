//! Round state machines.
//!
//! Every variant runs `Presenting -> AwaitingResponse -> Feedback` per round
//! and enters `Complete` once. Inputs outside `AwaitingResponse` are ignored,
//! which is what keeps a double tap from being scored twice. Timers are polled
//! through [`Game::on_tick`] and die with the session on teardown.

pub mod choice;
mod common;
pub mod emitter;
pub mod memory;
pub mod narration;
pub mod self_paced;
pub mod timer;

pub use choice::ChoiceGame;
pub use emitter::{Grading, ResultEmitter};
pub use memory::{Card, CardFace, MemoryBoard, MemoryGame};
pub use narration::NarrationGame;
pub use self_paced::SelfPacedGame;
pub use timer::{Scheduler, TimerKind};

use rand::Rng;
use std::time::Duration;

use crate::content::{Content, Round};
use crate::error::EngineError;
use crate::session::{SessionResult, SessionState};
use crate::variant::{Family, GameVariant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Presenting,
    AwaitingResponse,
    Feedback,
    Complete,
}

/// User input events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Pick an answer.
    Choose(String),
    /// Turn a memory card face up.
    Flip(usize),
    /// Acknowledge a self-paced round, or stop a recording.
    Done,
    StartRecording,
}

/// What the last input or tick did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Out of phase, duplicate, or after teardown. Nothing changed.
    Ignored,
    Updated,
    /// The session just entered `Complete`. Returned exactly once.
    Completed(SessionResult),
}

impl Step {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Step::Ignored)
    }

    pub fn completed(&self) -> Option<&SessionResult> {
        match self {
            Step::Completed(result) => Some(result),
            _ => None,
        }
    }
}

/// What the feedback phase is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Incorrect { expected: String },
    /// Unscored round acknowledged.
    Done,
    Mismatch,
}

/// Capability shared by every game variant.
pub trait Game {
    fn variant(&self) -> GameVariant;

    fn phase(&self) -> Phase;

    fn handle(&mut self, input: Input, now: Duration) -> Step;

    /// Fires due timers.
    fn on_tick(&mut self, now: Duration) -> Step;

    /// Cancels pending timers; later inputs and ticks are ignored.
    fn teardown(&mut self);

    fn is_torn_down(&self) -> bool;

    fn state(&self) -> &SessionState;

    fn current_round(&self) -> Option<&Round>;

    fn feedback(&self) -> Option<&Feedback>;

    fn result(&self) -> Option<&SessionResult>;

    fn next_deadline(&self) -> Option<Duration>;

    /// Card layout for matching games.
    fn board(&self) -> Option<&MemoryBoard> {
        None
    }

    /// Seconds recorded so far, for recording games.
    fn recorded_secs(&self, _now: Duration) -> Option<u64> {
        None
    }
}

/// Constructs the state machine for `content.variant`, starting at `now`.
pub fn build<R: Rng + ?Sized>(
    content: Content,
    rng: &mut R,
    now: Duration,
) -> Result<Box<dyn Game>, EngineError> {
    if content.is_empty() {
        return Err(EngineError::NoContent(content.variant));
    }
    let game: Box<dyn Game> = match content.variant.family() {
        Family::Choice => Box::new(ChoiceGame::new(content, now)?),
        Family::SelfPaced => Box::new(SelfPacedGame::new(content, now)?),
        Family::Matching => Box::new(MemoryGame::new(content, rng, now)?),
        Family::Recording => Box::new(NarrationGame::new(content, now)?),
    };
    Ok(game)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Difficulty, Timing};
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn build_refuses_empty_content() {
        let content = Content {
            variant: GameVariant::Mimicry,
            difficulty: Difficulty::default(),
            rounds: Vec::new(),
            timing: Timing::for_variant(GameVariant::Mimicry),
        };
        let mut rng = StdRng::seed_from_u64(0);
        let result = build(content, &mut rng, Duration::ZERO);
        assert_matches!(result.err(), Some(EngineError::NoContent(GameVariant::Mimicry)));
    }

    #[test]
    fn build_picks_machine_by_family() {
        let mut rng = StdRng::seed_from_u64(0);
        for variant in GameVariant::ALL {
            let content = crate::content::resolve(
                variant,
                &serde_json::Value::Null,
                Difficulty::new(1),
                &mut rng,
            )
            .unwrap();
            let game = build(content, &mut rng, Duration::ZERO).unwrap();
            assert_eq!(game.variant(), variant);
            let expected = match variant {
                GameVariant::FlashReading => Phase::Presenting,
                _ => Phase::AwaitingResponse,
            };
            assert_eq!(game.phase(), expected, "{variant}");
            assert_eq!(game.board().is_some(), variant == GameVariant::MemoryMatch);
        }
    }
}
