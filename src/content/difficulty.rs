use serde::{Deserialize, Serialize};

/// Difficulty chosen for a patient's assignment, always within `1..=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 3;

    /// Out-of-range levels are clamped rather than rejected.
    pub fn new(level: i64) -> Self {
        Self(level.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub fn level(&self) -> u8 {
        self.0
    }

    /// Tier for variants with discrete content tiers; clamped to the last tier.
    /// Callers must not pass `tiers == 0`.
    pub fn tier_index(&self, tiers: usize) -> usize {
        (self.0 as usize - 1).min(tiers.saturating_sub(1))
    }

    /// Dynamically sized sessions: `min(base + level * step, available)`.
    pub fn session_len(&self, base: usize, step: usize, available: usize) -> usize {
        (base + self.0 as usize * step).min(available)
    }

    /// Picks the entry for this level from a per-level table, clamped to its end.
    pub fn pick<'a, T>(&self, table: &'a [T]) -> Option<&'a T> {
        if table.is_empty() {
            None
        } else {
            table.get(self.tier_index(table.len()))
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl From<i64> for Difficulty {
    fn from(level: i64) -> Self {
        Self::new(level)
    }
}

impl From<Difficulty> for u8 {
    fn from(d: Difficulty) -> Self {
        d.0
    }
}
