//! Pure scoring functions shared by every game variant.
//!
//! Accuracy is always an integer percentage in `0..=100`. Star tiers are
//! derived from accuracy for scored games, fixed at the maximum for
//! self-paced games, and derived from recorded time for free speech.

use crate::variant::ScorePolicy;

pub const MAX_STARS: u8 = 3;

/// `round(100 * correct / total)`; a session with no rounds never reaches scoring.
pub fn choice_accuracy(correct: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let ratio = correct.min(total) as f64 / total as f64;
    (ratio * 100.0).round() as u8
}

/// Efficiency of a matching session: `round(100 * min(ideal / actual, 1))`.
///
/// Undefined until at least one pair has been attempted.
pub fn matching_accuracy(ideal_attempts: u32, actual_attempts: u32) -> Option<u8> {
    if actual_attempts == 0 {
        return None;
    }
    let ratio = (ideal_attempts as f64 / actual_attempts as f64).min(1.0);
    Some((ratio * 100.0).round() as u8)
}

pub fn stars_for_accuracy(accuracy: u8) -> u8 {
    match accuracy {
        90.. => 3,
        70..=89 => 2,
        50..=69 => 1,
        _ => 0,
    }
}

/// Free-speech recordings are tiered by effort rather than skill.
pub fn stars_for_duration(recorded_secs: u64) -> u8 {
    match recorded_secs {
        45.. => 3,
        20..=44 => 2,
        _ => 1,
    }
}

/// Completion credit for self-paced games.
pub fn stars_for_completion() -> u8 {
    MAX_STARS
}

pub fn score(policy: ScorePolicy, correct: u32, total: u32) -> u32 {
    match policy {
        ScorePolicy::Correct => correct,
        ScorePolicy::CorrectTimesTen | ScorePolicy::PairsTimesTen => correct * 10,
        ScorePolicy::CompletedTimesTen => total * 10,
    }
}
