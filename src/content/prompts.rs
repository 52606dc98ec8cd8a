//! Content for self-paced and recording games. These rounds carry no answer
//! choices; the target is the text the child says.

use rand::Rng;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use super::defaults::parse_or_default;
use super::shuffle::shuffled;
use super::{Difficulty, Round};
use crate::error::EngineError;
use crate::variant::GameVariant;

const DEFAULT_MAX_RECORDING_SECS: u64 = 120;

#[derive(Deserialize, Debug, Clone)]
pub struct SpeechPrompt {
    pub text: String,
    #[serde(default)]
    pub emoji: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct MimicryConfig {
    pub prompts: Vec<SpeechPrompt>,
}

#[derive(Deserialize, Debug)]
pub struct Story {
    pub title: String,
    pub pages: Vec<String>,
    #[serde(default)]
    pub emoji: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct StoryConfig {
    pub stories: Vec<Story>,
}

#[derive(Deserialize, Debug)]
pub struct TongueTwisterConfig {
    pub twisters: Vec<String>,
}

#[derive(Deserialize, Debug)]
pub struct NarrationConfig {
    pub prompts: Vec<SpeechPrompt>,
    #[serde(default)]
    pub max_seconds: Option<u64>,
}

fn prompt_round(prompt: SpeechPrompt) -> Round {
    Round::new(prompt.text.clone())
        .with_asset(prompt.emoji)
        .with_prompt(prompt.text)
}

/// `min(2 + d, n)` prompts, shuffled.
pub fn mimicry<R: Rng + ?Sized>(
    config: &Value,
    difficulty: Difficulty,
    rng: &mut R,
) -> Result<Vec<Round>, EngineError> {
    let cfg: MimicryConfig = parse_or_default(GameVariant::Mimicry, config)?;
    let len = difficulty.session_len(2, 1, cfg.prompts.len());
    let rounds = cfg.prompts.into_iter().take(len).map(prompt_round).collect();
    Ok(shuffled(rounds, rng))
}

/// The pages of the story at the difficulty's tier, in reading order.
pub fn story(config: &Value, difficulty: Difficulty) -> Result<Vec<Round>, EngineError> {
    let cfg: StoryConfig = parse_or_default(GameVariant::ArticulationStory, config)?;
    let Some(story) = difficulty.pick(&cfg.stories) else {
        return Ok(Vec::new());
    };

    Ok(story
        .pages
        .iter()
        .map(|page| {
            Round::new(page.clone())
                .with_asset(story.emoji.clone())
                .with_prompt(page.clone())
                .with_label(story.title.clone())
        })
        .collect())
}

/// `min(1 + d, n)` twisters in authored order.
pub fn tongue_twisters(config: &Value, difficulty: Difficulty) -> Result<Vec<Round>, EngineError> {
    let cfg: TongueTwisterConfig = parse_or_default(GameVariant::TongueTwister, config)?;
    let len = difficulty.session_len(1, 1, cfg.twisters.len());
    Ok(cfg
        .twisters
        .into_iter()
        .take(len)
        .map(|text| Round::new(text.clone()).with_prompt(text))
        .collect())
}

/// A single free-speech prompt picked by tier, plus the recording limit.
pub fn narration(
    config: &Value,
    difficulty: Difficulty,
) -> Result<(Vec<Round>, Duration), EngineError> {
    let cfg: NarrationConfig = parse_or_default(GameVariant::Narration, config)?;
    let limit = Duration::from_secs(
        cfg.max_seconds
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_MAX_RECORDING_SECS),
    );
    let rounds = difficulty
        .pick(&cfg.prompts)
        .cloned()
        .map(prompt_round)
        .into_iter()
        .collect();
    Ok((rounds, limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    #[test]
    fn mimicry_length() {
        let mut rng = StdRng::seed_from_u64(8);
        let rounds = mimicry(&Value::Null, Difficulty::new(3), &mut rng).unwrap();
        assert_eq!(rounds.len(), 5);
        assert!(rounds.iter().all(|r| r.choices.is_empty()));
    }

    #[test]
    fn story_tier_is_clamped() {
        let config = json!({ "stories": [
            { "title": "One", "pages": ["a", "b"] },
            { "title": "Two", "pages": ["c", "d", "e"] }
        ]});
        let rounds = story(&config, Difficulty::new(3)).unwrap();
        assert_eq!(rounds.len(), 3);
        assert_eq!(rounds[0].target, "c");
        assert_eq!(rounds[0].item(), "Two");
    }

    #[test]
    fn story_without_pages_is_empty() {
        let config = json!({ "stories": [{ "title": "Blank", "pages": [] }] });
        assert!(story(&config, Difficulty::new(1)).unwrap().is_empty());
    }

    #[test]
    fn twisters_keep_authored_order() {
        let config = json!({ "twisters": ["a", "b", "c", "d", "e"] });
        let rounds = tongue_twisters(&config, Difficulty::new(2)).unwrap();
        let targets: Vec<&str> = rounds.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(targets, vec!["a", "b", "c"]);
    }

    #[test]
    fn narration_limit_from_config() {
        let config = json!({ "prompts": [{ "text": "Talk" }], "max_seconds": 30 });
        let (rounds, limit) = narration(&config, Difficulty::new(2)).unwrap();
        assert_eq!(rounds.len(), 1);
        assert_eq!(limit, Duration::from_secs(30));
    }

    #[test]
    fn narration_zero_limit_uses_default() {
        let config = json!({ "prompts": [{ "text": "Talk" }], "max_seconds": 0 });
        let (_, limit) = narration(&config, Difficulty::new(1)).unwrap();
        assert_eq!(limit, Duration::from_secs(120));
    }
}
