pub mod choice;
pub mod defaults;
pub mod difficulty;
pub mod memory;
pub mod prompts;
pub mod shuffle;

pub use difficulty::Difficulty;
pub use shuffle::SeedSequence;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::EngineError;
use crate::variant::GameVariant;

/// One unit of interaction. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Round {
    /// Expected answer for scored rounds; the text to say for self-paced ones.
    pub target: String,
    /// Answer choices in display order; empty for unscored rounds.
    pub choices: Vec<String>,
    pub asset: Option<String>,
    pub prompt: Option<String>,
    /// What the round is about when that differs from the target (a word
    /// whose syllables are counted, say).
    pub label: Option<String>,
}

impl Round {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            choices: Vec::new(),
            asset: None,
            prompt: None,
            label: None,
        }
    }

    pub fn with_choices(mut self, choices: Vec<String>) -> Self {
        self.choices = choices;
        self
    }

    pub fn with_asset(mut self, asset: Option<String>) -> Self {
        self.asset = asset;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Name of the item under test, used when recording mistakes.
    pub fn item(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.target)
    }
}

/// Timing windows resolved for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// How long the stimulus stays up before answers are accepted.
    pub display: Option<Duration>,
    /// Length of the correctness/acknowledgement display.
    pub feedback: Duration,
    /// Hard stop for recording variants.
    pub max_recording: Option<Duration>,
}

impl Timing {
    pub fn for_variant(variant: GameVariant) -> Self {
        let feedback_ms = match variant {
            GameVariant::Discrimination => 1200,
            GameVariant::FlashReading => 800,
            GameVariant::MemoryMatch => 1000,
            GameVariant::Mimicry | GameVariant::ArticulationStory | GameVariant::TongueTwister => {
                600
            }
            GameVariant::Narration => 1200,
            _ => 1000,
        };
        Self {
            display: None,
            feedback: Duration::from_millis(feedback_ms),
            max_recording: None,
        }
    }
}

/// Output of the resolver: the session's rounds and timing.
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    pub variant: GameVariant,
    pub difficulty: Difficulty,
    pub rounds: Vec<Round>,
    pub timing: Timing,
}

impl Content {
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }
}

/// Turns an assignment's config and difficulty into the rounds of a session.
///
/// Never returns an empty round list: zero rounds is reported as
/// [`EngineError::NoContent`].
pub fn resolve<R: Rng + ?Sized>(
    variant: GameVariant,
    config: &Value,
    difficulty: Difficulty,
    rng: &mut R,
) -> Result<Content, EngineError> {
    let mut timing = Timing::for_variant(variant);

    let rounds = match variant {
        GameVariant::WordRecognition => choice::word_recognition(config, difficulty, rng)?,
        GameVariant::Discrimination => choice::discrimination(config, rng)?,
        GameVariant::PronounQuiz => choice::pronoun_quiz(config, rng)?,
        GameVariant::FlashReading => {
            let (rounds, display) = choice::flash_reading(config, difficulty, rng)?;
            timing.display = Some(display);
            rounds
        }
        GameVariant::SyllableCount => choice::syllable_count(config, difficulty, rng)?,
        GameVariant::FirstSound => choice::first_sound(config, rng)?,
        GameVariant::MemoryMatch => memory::pairs(config, difficulty, rng)?,
        GameVariant::Mimicry => prompts::mimicry(config, difficulty, rng)?,
        GameVariant::ArticulationStory => prompts::story(config, difficulty)?,
        GameVariant::TongueTwister => prompts::tongue_twisters(config, difficulty)?,
        GameVariant::Narration => {
            let (rounds, limit) = prompts::narration(config, difficulty)?;
            timing.max_recording = Some(limit);
            rounds
        }
    };

    if rounds.is_empty() {
        return Err(EngineError::NoContent(variant));
    }

    debug!(game = %variant, level = difficulty.level(), rounds = rounds.len(), "resolved content");

    Ok(Content {
        variant,
        difficulty,
        rounds,
        timing,
    })
}
