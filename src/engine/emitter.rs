use std::time::Duration;

use crate::scoring;
use crate::session::{SessionResult, SessionState};
use crate::variant::GameVariant;

/// How a finished session is graded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grading {
    /// Correct answers over rounds.
    Choice,
    /// Efficiency: ideal flips over actual flips.
    Matching { ideal: u32, actual: u32 },
    /// Effort credit: every round counts, maximum stars.
    Completion,
    /// Free speech: stars from the recorded length.
    Recording { secs: u64 },
}

/// Builds the session's result exactly once.
#[derive(Debug, Default)]
pub struct ResultEmitter {
    emitted: bool,
}

impl ResultEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_emitted(&self) -> bool {
        self.emitted
    }

    /// Returns `None` if already emitted or if the session is not finished.
    pub fn emit(
        &mut self,
        variant: GameVariant,
        state: &SessionState,
        grading: Grading,
        now: Duration,
    ) -> Option<SessionResult> {
        if self.emitted || !state.all_items_completed() {
            return None;
        }

        let total = state.items_total as u32;
        let completed = state.items_completed as u32;
        let policy = variant.score_policy();

        let (accuracy, stars_earned, duration_seconds, credited) = match grading {
            Grading::Choice => {
                let accuracy = scoring::choice_accuracy(state.correct_count, total);
                (
                    accuracy,
                    scoring::stars_for_accuracy(accuracy),
                    state.duration_secs(now),
                    state.correct_count,
                )
            }
            Grading::Matching { ideal, actual } => {
                let accuracy = scoring::matching_accuracy(ideal, actual)?;
                (
                    accuracy,
                    scoring::stars_for_accuracy(accuracy),
                    state.duration_secs(now),
                    completed,
                )
            }
            Grading::Completion => (
                100,
                scoring::stars_for_completion(),
                state.duration_secs(now),
                completed,
            ),
            Grading::Recording { secs } => (100, scoring::stars_for_duration(secs), secs, completed),
        };

        self.emitted = true;
        Some(SessionResult {
            score: scoring::score(policy, credited, total),
            stars_earned,
            accuracy,
            items_completed: completed,
            items_total: total,
            mistakes: state.mistakes.clone(),
            duration_seconds,
        })
    }
}
