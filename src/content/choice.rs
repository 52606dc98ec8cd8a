//! Content for the multiple-choice family.

use itertools::Itertools;
use rand::Rng;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use super::defaults::parse_or_default;
use super::shuffle::{choices_with_distractors, shuffled};
use super::{Difficulty, Round};
use crate::error::EngineError;
use crate::variant::GameVariant;

const DEFAULT_FLASH_DISPLAY_MS: [u64; 3] = [2000, 1400, 800];
const FLASH_CHOICES: usize = 3;
const MIN_SYLLABLE_CHOICES: u8 = 4;

#[derive(Deserialize, Debug, Clone)]
pub struct WordItem {
    pub word: String,
    #[serde(default)]
    pub emoji: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct WordRecognitionConfig {
    pub items: Vec<WordItem>,
}

#[derive(Deserialize, Debug)]
pub struct DiscriminationPair {
    pub target: String,
    pub foil: String,
    #[serde(default)]
    pub emoji: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct DiscriminationConfig {
    pub pairs: Vec<DiscriminationPair>,
}

#[derive(Deserialize, Debug)]
pub struct Question {
    pub prompt: String,
    pub answer: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub emoji: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct PronounQuizConfig {
    pub questions: Vec<Question>,
}

#[derive(Deserialize, Debug)]
pub struct FlashReadingConfig {
    pub tiers: Vec<Vec<String>>,
    #[serde(default)]
    pub display_ms: Option<Vec<u64>>,
}

#[derive(Deserialize, Debug)]
pub struct SyllableWord {
    pub word: String,
    pub syllables: u8,
    #[serde(default)]
    pub emoji: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct SyllableCountConfig {
    pub words: Vec<SyllableWord>,
}

#[derive(Deserialize, Debug)]
pub struct SoundRound {
    pub sound: String,
    pub answer: String,
    pub options: Vec<String>,
}

#[derive(Deserialize, Debug)]
pub struct FirstSoundConfig {
    pub rounds: Vec<SoundRound>,
}

/// Picture shown, pick the matching word. `min(2 + 2d, n)` rounds drawn from
/// the front of the list, played in random order, `2 + d` choices each.
pub fn word_recognition<R: Rng + ?Sized>(
    config: &Value,
    difficulty: Difficulty,
    rng: &mut R,
) -> Result<Vec<Round>, EngineError> {
    let cfg: WordRecognitionConfig = parse_or_default(GameVariant::WordRecognition, config)?;
    let pool: Vec<String> = cfg.items.iter().map(|i| i.word.clone()).collect();
    let len = difficulty.session_len(2, 2, cfg.items.len());
    let choice_count = 2 + difficulty.level() as usize;

    let rounds = cfg
        .items
        .iter()
        .enumerate()
        .take(len)
        .map(|(idx, item)| {
            Round::new(item.word.clone())
                .with_choices(choices_with_distractors(&pool, idx, choice_count, rng))
                .with_asset(item.emoji.clone())
        })
        .collect();

    Ok(shuffled(rounds, rng))
}

/// Minimal pairs: every authored pair, binary choice between target and foil.
pub fn discrimination<R: Rng + ?Sized>(
    config: &Value,
    rng: &mut R,
) -> Result<Vec<Round>, EngineError> {
    let cfg: DiscriminationConfig = parse_or_default(GameVariant::Discrimination, config)?;
    let rounds = cfg
        .pairs
        .into_iter()
        .map(|pair| {
            let choices = shuffled(vec![pair.target.clone(), pair.foil], rng);
            Round::new(pair.target)
                .with_choices(choices)
                .with_asset(pair.emoji)
        })
        .collect();

    Ok(shuffled(rounds, rng))
}

/// Fill-the-gap pronoun questions in authored order.
pub fn pronoun_quiz<R: Rng + ?Sized>(
    config: &Value,
    rng: &mut R,
) -> Result<Vec<Round>, EngineError> {
    let cfg: PronounQuizConfig = parse_or_default(GameVariant::PronounQuiz, config)?;
    Ok(cfg
        .questions
        .into_iter()
        .map(|q| {
            let choices = options_with_answer(q.options, &q.answer, rng);
            Round::new(q.answer)
                .with_choices(choices)
                .with_asset(q.emoji)
                .with_prompt(q.prompt)
        })
        .collect())
}

/// Words of the difficulty's tier, each flashed for a tier-dependent time.
pub fn flash_reading<R: Rng + ?Sized>(
    config: &Value,
    difficulty: Difficulty,
    rng: &mut R,
) -> Result<(Vec<Round>, Duration), EngineError> {
    let cfg: FlashReadingConfig = parse_or_default(GameVariant::FlashReading, config)?;

    let display_ms = cfg
        .display_ms
        .as_deref()
        .and_then(|table| difficulty.pick(table))
        .or_else(|| difficulty.pick(&DEFAULT_FLASH_DISPLAY_MS))
        .copied()
        .unwrap_or(DEFAULT_FLASH_DISPLAY_MS[0]);

    let words: Vec<String> = match difficulty.pick(&cfg.tiers) {
        Some(tier) => tier.iter().unique().cloned().collect(),
        None => Vec::new(),
    };

    let rounds = (0..words.len())
        .map(|idx| {
            Round::new(words[idx].clone()).with_choices(choices_with_distractors(
                &words,
                idx,
                FLASH_CHOICES,
                rng,
            ))
        })
        .collect();

    Ok((shuffled(rounds, rng), Duration::from_millis(display_ms)))
}

/// Count the syllables: `min(3 + 2d, n)` words, numeric choices in order.
pub fn syllable_count<R: Rng + ?Sized>(
    config: &Value,
    difficulty: Difficulty,
    rng: &mut R,
) -> Result<Vec<Round>, EngineError> {
    let cfg: SyllableCountConfig = parse_or_default(GameVariant::SyllableCount, config)?;
    let words: Vec<SyllableWord> = cfg.words.into_iter().filter(|w| w.syllables > 0).collect();
    let len = difficulty.session_len(3, 2, words.len());

    let rounds = words
        .into_iter()
        .take(len)
        .map(|w| {
            let max = w.syllables.max(MIN_SYLLABLE_CHOICES);
            let choices = (1..=max).map(|n| n.to_string()).collect();
            Round::new(w.syllables.to_string())
                .with_choices(choices)
                .with_asset(w.emoji)
                .with_prompt(w.word.clone())
                .with_label(w.word)
        })
        .collect();

    Ok(shuffled(rounds, rng))
}

/// Which word starts with the sound; authored order.
pub fn first_sound<R: Rng + ?Sized>(
    config: &Value,
    rng: &mut R,
) -> Result<Vec<Round>, EngineError> {
    let cfg: FirstSoundConfig = parse_or_default(GameVariant::FirstSound, config)?;
    Ok(cfg
        .rounds
        .into_iter()
        .map(|r| {
            let prompt = format!("Which word starts with \"{}\"?", r.sound);
            let choices = options_with_answer(r.options, &r.answer, rng);
            Round::new(r.answer).with_choices(choices).with_prompt(prompt)
        })
        .collect())
}

fn options_with_answer<R: Rng + ?Sized>(
    options: Vec<String>,
    answer: &str,
    rng: &mut R,
) -> Vec<String> {
    let mut choices: Vec<String> = options.into_iter().unique().collect();
    if !choices.iter().any(|c| c == answer) {
        choices.push(answer.to_string());
    }
    shuffled(choices, rng)
}
