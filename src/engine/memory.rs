use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;

use super::common::{merge, SessionCore};
use super::emitter::Grading;
use super::timer::TimerKind;
use super::{Feedback, Game, Input, Phase, Step};
use crate::content::{Content, Round};
use crate::error::EngineError;
use crate::scoring;
use crate::session::{SessionResult, SessionState};
use crate::variant::GameVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardFace {
    Word,
    Picture,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub pair: usize,
    pub face: CardFace,
    pub label: String,
}

/// Cards on the table: at most two flipped, the rest hidden or matched.
#[derive(Debug, Clone, Default)]
pub struct MemoryBoard {
    cards: Vec<Card>,
    flipped: Vec<usize>,
    matched: Vec<bool>,
}

impl MemoryBoard {
    /// One word card and one picture card per round, shuffled.
    pub fn deal<R: Rng + ?Sized>(rounds: &[Round], rng: &mut R) -> Self {
        let mut cards: Vec<Card> = rounds
            .iter()
            .enumerate()
            .flat_map(|(pair, round)| {
                let picture = round.asset.clone().unwrap_or_else(|| round.target.clone());
                [
                    Card {
                        pair,
                        face: CardFace::Word,
                        label: round.target.clone(),
                    },
                    Card {
                        pair,
                        face: CardFace::Picture,
                        label: picture,
                    },
                ]
            })
            .collect();
        cards.shuffle(rng);
        Self::from_cards(cards)
    }

    pub fn from_cards(cards: Vec<Card>) -> Self {
        let matched = vec![false; cards.len()];
        Self {
            cards,
            flipped: Vec::with_capacity(2),
            matched,
        }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn flipped(&self) -> &[usize] {
        &self.flipped
    }

    pub fn is_matched(&self, idx: usize) -> bool {
        self.matched.get(idx).copied().unwrap_or(false)
    }

    pub fn is_face_up(&self, idx: usize) -> bool {
        self.is_matched(idx) || self.flipped.contains(&idx)
    }

    pub fn pair_count(&self) -> usize {
        self.cards.len() / 2
    }

    pub fn matched_pairs(&self) -> usize {
        self.matched.iter().filter(|m| **m).count() / 2
    }

    pub fn all_matched(&self) -> bool {
        self.matched.iter().all(|m| *m)
    }

    /// A word card only matches the picture card of its own pair.
    pub fn is_match(&self, a: usize, b: usize) -> bool {
        match (self.cards.get(a), self.cards.get(b)) {
            (Some(x), Some(y)) => a != b && x.pair == y.pair && x.face != y.face,
            _ => false,
        }
    }

    fn label(&self, idx: usize) -> &str {
        &self.cards[idx].label
    }
}

/// Card-matching game. Accuracy measures efficiency: one attempt per pair is
/// ideal.
#[derive(Debug)]
pub struct MemoryGame {
    core: SessionCore,
    board: MemoryBoard,
}

impl MemoryGame {
    pub fn new<R: Rng + ?Sized>(
        content: Content,
        rng: &mut R,
        now: Duration,
    ) -> Result<Self, EngineError> {
        let board = MemoryBoard::deal(&content.rounds, rng);
        Self::with_board(content, board, now)
    }

    pub fn with_board(
        content: Content,
        board: MemoryBoard,
        now: Duration,
    ) -> Result<Self, EngineError> {
        let pairs = board.pair_count();
        let core = SessionCore::new(content, pairs, now)?;
        Ok(Self { core, board })
    }

    /// Efficiency so far; `None` until the first pair has been tried.
    pub fn accuracy(&self) -> Option<u8> {
        scoring::matching_accuracy(self.board.pair_count() as u32, self.core.state.attempt_count())
    }

    fn flip(&mut self, idx: usize, now: Duration) -> Step {
        if idx >= self.board.cards.len() || self.board.is_face_up(idx) {
            return Step::Ignored;
        }
        self.board.flipped.push(idx);
        if self.board.flipped.len() < 2 {
            return Step::Updated;
        }

        let (first, second) = (self.board.flipped[0], self.board.flipped[1]);
        let pair = self.board.cards[first].pair;
        let got = self.board.label(second).to_string();
        self.core.state.round_index = pair;

        if self.board.is_match(first, second) {
            self.board.matched[first] = true;
            self.board.matched[second] = true;
            self.board.flipped.clear();
            self.core.state.record_attempt(&got, true, now);
            self.core.state.complete_item(now);
            if self.board.all_matched() {
                let grading = Grading::Matching {
                    ideal: self.board.pair_count() as u32,
                    actual: self.core.state.attempt_count(),
                };
                return self.core.finish(grading, now);
            }
            return Step::Updated;
        }

        let item = self
            .core
            .rounds
            .get(pair)
            .map(|r| r.target.clone())
            .unwrap_or_else(|| self.board.label(first).to_string());
        let expected = self
            .board
            .cards
            .iter()
            .enumerate()
            .find(|(i, _)| self.board.is_match(first, *i))
            .map(|(_, c)| c.label.clone())
            .unwrap_or_default();
        self.core.state.record_attempt(&got, false, now);
        self.core.state.record_mistake(&item, &expected, &got);
        self.core.feedback = Some(Feedback::Mismatch);
        self.core.state.phase = Phase::Feedback;
        self.core
            .timers
            .schedule(now + self.core.timing.feedback, TimerKind::HideCards);
        Step::Updated
    }
}

impl Game for MemoryGame {
    fn variant(&self) -> GameVariant {
        self.core.variant
    }

    fn phase(&self) -> Phase {
        self.core.phase()
    }

    fn handle(&mut self, input: Input, now: Duration) -> Step {
        if !self.core.accepts_input() {
            return Step::Ignored;
        }
        match input {
            Input::Flip(idx) => self.flip(idx, now),
            _ => Step::Ignored,
        }
    }

    fn on_tick(&mut self, now: Duration) -> Step {
        let mut step = Step::Ignored;
        for (kind, _) in self.core.due(now) {
            if kind == TimerKind::HideCards && self.core.phase() == Phase::Feedback {
                self.board.flipped.clear();
                self.core.feedback = None;
                self.core.state.phase = Phase::AwaitingResponse;
                step = merge(step, Step::Updated);
            }
        }
        step
    }

    fn teardown(&mut self) {
        self.core.teardown();
    }

    fn is_torn_down(&self) -> bool {
        self.core.is_torn_down()
    }

    fn state(&self) -> &SessionState {
        &self.core.state
    }

    /// The whole board is in play at once; there is no single current round.
    fn current_round(&self) -> Option<&Round> {
        None
    }

    fn feedback(&self) -> Option<&Feedback> {
        self.core.feedback.as_ref()
    }

    fn result(&self) -> Option<&SessionResult> {
        self.core.result()
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.core.timers.next_deadline()
    }

    fn board(&self) -> Option<&MemoryBoard> {
        Some(&self.board)
    }
}
