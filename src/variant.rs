use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Every mini-game a therapist can assign.
///
/// The kebab-case name doubles as the stable game id handed to the
/// persistence layer.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    ValueEnum,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GameVariant {
    WordRecognition,
    Discrimination,
    PronounQuiz,
    FlashReading,
    SyllableCount,
    FirstSound,
    MemoryMatch,
    Mimicry,
    ArticulationStory,
    TongueTwister,
    Narration,
}

/// Structural family a variant belongs to; selects the state machine.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Family {
    Choice,
    Matching,
    SelfPaced,
    Recording,
}

/// How the numeric score is derived. Scales differ between variants and are
/// not comparable across them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ScorePolicy {
    Correct,
    CorrectTimesTen,
    PairsTimesTen,
    CompletedTimesTen,
}

impl GameVariant {
    pub const ALL: [GameVariant; 11] = [
        GameVariant::WordRecognition,
        GameVariant::Discrimination,
        GameVariant::PronounQuiz,
        GameVariant::FlashReading,
        GameVariant::SyllableCount,
        GameVariant::FirstSound,
        GameVariant::MemoryMatch,
        GameVariant::Mimicry,
        GameVariant::ArticulationStory,
        GameVariant::TongueTwister,
        GameVariant::Narration,
    ];

    pub fn family(&self) -> Family {
        match self {
            GameVariant::WordRecognition
            | GameVariant::Discrimination
            | GameVariant::PronounQuiz
            | GameVariant::FlashReading
            | GameVariant::SyllableCount
            | GameVariant::FirstSound => Family::Choice,
            GameVariant::MemoryMatch => Family::Matching,
            GameVariant::Mimicry | GameVariant::ArticulationStory | GameVariant::TongueTwister => {
                Family::SelfPaced
            }
            GameVariant::Narration => Family::Recording,
        }
    }

    pub fn score_policy(&self) -> ScorePolicy {
        match self {
            GameVariant::Discrimination | GameVariant::SyllableCount => ScorePolicy::Correct,
            GameVariant::WordRecognition
            | GameVariant::PronounQuiz
            | GameVariant::FlashReading
            | GameVariant::FirstSound => ScorePolicy::CorrectTimesTen,
            GameVariant::MemoryMatch => ScorePolicy::PairsTimesTen,
            GameVariant::Mimicry
            | GameVariant::ArticulationStory
            | GameVariant::TongueTwister
            | GameVariant::Narration => ScorePolicy::CompletedTimesTen,
        }
    }

    /// Stable id used for persistence and the embedded content file name.
    pub fn game_id(&self) -> String {
        self.to_string()
    }

    pub fn title(&self) -> &'static str {
        match self {
            GameVariant::WordRecognition => "Word Recognition",
            GameVariant::Discrimination => "Sound Discrimination",
            GameVariant::PronounQuiz => "Pronoun Quiz",
            GameVariant::FlashReading => "Flash Reading",
            GameVariant::SyllableCount => "Syllable Count",
            GameVariant::FirstSound => "First Sound",
            GameVariant::MemoryMatch => "Memory Match",
            GameVariant::Mimicry => "Mimicry",
            GameVariant::ArticulationStory => "Articulation Story",
            GameVariant::TongueTwister => "Tongue Twisters",
            GameVariant::Narration => "Free Speech",
        }
    }
}
