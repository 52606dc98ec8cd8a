use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::engine::Phase;

/// A wrong answer, kept for the therapist's review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mistake {
    pub item: String,
    pub expected: String,
    pub got: String,
}

/// One scored input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub round: usize,
    pub choice: String,
    pub correct: bool,
    /// Milliseconds since the session started.
    pub offset_ms: u64,
}

/// Terminal record of a play-through. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    pub score: u32,
    pub stars_earned: u8,
    pub accuracy: u8,
    pub items_completed: u32,
    pub items_total: u32,
    pub mistakes: Vec<Mistake>,
    pub duration_seconds: u64,
}

/// Transient state of one play-through.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub phase: Phase,
    pub round_index: usize,
    pub items_total: usize,
    pub items_completed: usize,
    pub correct_count: u32,
    pub attempts: Vec<Attempt>,
    pub mistakes: Vec<Mistake>,
    pub started_at: Duration,
    /// Set when the last attempt is scored.
    pub finished_at: Option<Duration>,
}

impl SessionState {
    pub fn new(items_total: usize, started_at: Duration, phase: Phase) -> Self {
        Self {
            phase,
            round_index: 0,
            items_total,
            items_completed: 0,
            correct_count: 0,
            attempts: Vec::new(),
            mistakes: Vec::new(),
            started_at,
            finished_at: None,
        }
    }

    pub fn record_attempt(&mut self, choice: &str, correct: bool, now: Duration) {
        self.attempts.push(Attempt {
            round: self.round_index,
            choice: choice.to_string(),
            correct,
            offset_ms: now.saturating_sub(self.started_at).as_millis() as u64,
        });
        if correct {
            self.correct_count += 1;
        }
    }

    pub fn record_mistake(&mut self, item: &str, expected: &str, got: &str) {
        self.mistakes.push(Mistake {
            item: item.to_string(),
            expected: expected.to_string(),
            got: got.to_string(),
        });
    }

    /// Marks one more item done; the last one stamps the finish time.
    pub fn complete_item(&mut self, now: Duration) {
        self.items_completed = (self.items_completed + 1).min(self.items_total);
        if self.items_completed == self.items_total && self.finished_at.is_none() {
            self.finished_at = Some(now);
        }
    }

    pub fn all_items_completed(&self) -> bool {
        self.items_completed == self.items_total
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempts.len() as u32
    }

    /// Whole seconds from start to the final scored attempt (or `now` if the
    /// session is still running).
    pub fn duration_secs(&self, now: Duration) -> u64 {
        let end = self.finished_at.unwrap_or(now);
        end.saturating_sub(self.started_at).as_secs_f64().round() as u64
    }
}
