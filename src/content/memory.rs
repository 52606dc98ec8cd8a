use rand::Rng;
use serde::Deserialize;
use serde_json::Value;

use super::choice::WordItem;
use super::defaults::parse_or_default;
use super::shuffle::shuffled;
use super::{Difficulty, Round};
use crate::error::EngineError;
use crate::variant::GameVariant;

#[derive(Deserialize, Debug)]
pub struct MemoryConfig {
    pub pairs: Vec<WordItem>,
}

/// Word/picture pairs for the matching game: `min(3 + d, n)` pairs from the
/// front of the list. Each round is one pair (target = word, asset = picture).
///
/// A pair without a picture falls back to showing the word on both cards.
pub fn pairs<R: Rng + ?Sized>(
    config: &Value,
    difficulty: Difficulty,
    rng: &mut R,
) -> Result<Vec<Round>, EngineError> {
    let cfg: MemoryConfig = parse_or_default(GameVariant::MemoryMatch, config)?;
    let len = difficulty.session_len(3, 1, cfg.pairs.len());

    let rounds = cfg
        .pairs
        .into_iter()
        .take(len)
        .map(|item| {
            let asset = item.emoji.unwrap_or_else(|| item.word.clone());
            Round::new(item.word).with_asset(Some(asset))
        })
        .collect();

    Ok(shuffled(rounds, rng))
}
