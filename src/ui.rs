use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::{card_key, App};
use crate::clock::Clock;
use crate::engine::{Feedback, Game, MemoryBoard, Phase};
use crate::host::{HostView, Notice};
use crate::scoring::MAX_STARS;
use crate::session::SessionResult;
use crate::store::PersistenceService;
use crate::variant::{Family, GameVariant};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
const CARDS_PER_ROW: usize = 4;

impl<S: PersistenceService, C: Clock> Widget for &App<S, C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        let ctx = self.host.context();
        let header = Paragraph::new(Line::from(vec![
            Span::styled(ctx.variant.title(), bold()),
            Span::styled(format!("   {}", ctx.patient_display_name), dim()),
        ]))
        .alignment(Alignment::Center);
        header.render(chunks[0], buf);

        let legend = match self.host.view() {
            HostView::Idle => {
                render_idle(ctx.variant, chunks[1], buf);
                "(enter) start / (esc)ape"
            }
            HostView::Playing => {
                if let Some(game) = self.host.game() {
                    render_game(game, self.host.clock().now(), chunks[1], buf);
                    legend_for(game.variant().family())
                } else {
                    ""
                }
            }
            HostView::Summary(result) => {
                render_summary(result, self.host.notices(), chunks[1], buf);
                "(r) play again / (esc)ape"
            }
        };

        if let Some(status) = &self.status {
            Paragraph::new(Span::styled(status.as_str(), Style::default().fg(Color::Red)))
                .alignment(Alignment::Center)
                .render(chunks[2], buf);
        }

        Paragraph::new(Span::styled(
            legend,
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .render(chunks[3], buf);
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    bold().add_modifier(Modifier::DIM)
}

fn legend_for(family: Family) -> &'static str {
    match family {
        Family::Choice => "(1-9) answer / (esc) back",
        Family::Matching => "(a-z) flip a card / (esc) back",
        Family::SelfPaced => "(space) done / (esc) back",
        Family::Recording => "(space) start or stop recording / (esc) back",
    }
}

fn instruction(variant: GameVariant) -> &'static str {
    match variant {
        GameVariant::WordRecognition => "Which word goes with the picture?",
        GameVariant::Discrimination => "Listen, then pick the word you heard.",
        GameVariant::FlashReading => "Read the word, then find it.",
        GameVariant::SyllableCount => "How many syllables?",
        GameVariant::MemoryMatch => "Match each word with its picture.",
        GameVariant::Mimicry => "Say it just like this.",
        GameVariant::ArticulationStory => "Read the page out loud.",
        GameVariant::TongueTwister => "Say it three times fast!",
        GameVariant::Narration => "Tell a story about this.",
        GameVariant::PronounQuiz | GameVariant::FirstSound => "",
    }
}

fn render_idle(variant: GameVariant, area: Rect, buf: &mut Buffer) {
    Paragraph::new(vec![
        Line::from(Span::styled(variant.title(), bold().fg(Color::Yellow))),
        Line::default(),
        Line::from(Span::styled("Press enter when you are ready", dim())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .render(centered(area, 3), buf);
}

fn render_game(game: &dyn Game, now: std::time::Duration, area: Rect, buf: &mut Buffer) {
    let state = game.state();
    let mut lines = vec![
        Line::from(Span::styled(
            format!(
                "{} / {}",
                (state.items_completed + 1).min(state.items_total),
                state.items_total
            ),
            dim(),
        )),
        Line::default(),
    ];

    if let Some(board) = game.board() {
        lines.extend(board_lines(board));
    } else if let Some(round) = game.current_round() {
        let text = instruction(game.variant());
        if !text.is_empty() {
            lines.push(Line::from(Span::styled(text, dim())));
        }
        if let Some(asset) = &round.asset {
            lines.push(Line::from(Span::raw(asset.clone())));
        }
        if let Some(prompt) = &round.prompt {
            lines.push(Line::from(Span::styled(prompt.clone(), bold())));
        }
        if game.phase() == Phase::Presenting {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                round.target.clone(),
                bold().fg(Color::Cyan),
            )));
        }
        if game.phase() != Phase::Presenting && !round.choices.is_empty() {
            lines.push(Line::default());
            let choices = round
                .choices
                .iter()
                .enumerate()
                .map(|(i, c)| Span::styled(format!("({}) {}   ", i + 1, c), bold()))
                .collect::<Vec<_>>();
            lines.push(Line::from(choices));
        }
        if let Some(secs) = game.recorded_secs(now) {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                format!("recorded {secs}s"),
                Style::default().fg(Color::Magenta),
            )));
        }
    }

    if let Some(feedback) = game.feedback() {
        lines.push(Line::default());
        lines.push(feedback_line(feedback));
    }

    let height = lines.len() as u16;
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(centered(area, height), buf);
}

fn feedback_line(feedback: &Feedback) -> Line<'static> {
    match feedback {
        Feedback::Correct => Line::from(Span::styled("Great job!", bold().fg(Color::Green))),
        Feedback::Incorrect { expected } => Line::from(Span::styled(
            format!("Nice try! It was {expected}"),
            bold().fg(Color::Red),
        )),
        Feedback::Done => Line::from(Span::styled("Well done!", bold().fg(Color::Green))),
        Feedback::Mismatch => Line::from(Span::styled("Not a match", bold().fg(Color::Yellow))),
    }
}

/// Face-down cards show their key; every cell is padded to the widest label.
fn board_lines(board: &MemoryBoard) -> Vec<Line<'static>> {
    let cell = board
        .cards()
        .iter()
        .map(|c| c.label.width())
        .max()
        .unwrap_or(1)
        .max(3);

    board
        .cards()
        .chunks(CARDS_PER_ROW)
        .enumerate()
        .map(|(row, cards)| {
            let spans = cards
                .iter()
                .enumerate()
                .map(|(col, card)| {
                    let idx = row * CARDS_PER_ROW + col;
                    let (text, style) = if board.is_matched(idx) {
                        (card.label.clone(), Style::default().fg(Color::Green))
                    } else if board.is_face_up(idx) {
                        (card.label.clone(), bold().fg(Color::Cyan))
                    } else {
                        (format!("[{}]", card_key(idx)), dim())
                    };
                    let pad = cell.saturating_sub(text.width());
                    Span::styled(format!(" {text}{} ", " ".repeat(pad)), style)
                })
                .collect::<Vec<_>>();
            Line::from(spans)
        })
        .collect()
}

fn stars(earned: u8) -> String {
    let earned = earned.min(MAX_STARS) as usize;
    format!(
        "{}{}",
        "★".repeat(earned),
        "☆".repeat(MAX_STARS as usize - earned)
    )
}

fn render_summary(result: &SessionResult, notices: &[Notice], area: Rect, buf: &mut Buffer) {
    let mut lines = vec![
        Line::from(Span::styled(
            stars(result.stars_earned),
            bold().fg(Color::Yellow),
        )),
        Line::default(),
        Line::from(Span::styled(
            format!(
                "score {}   {}% acc   {}/{} done   {}s",
                result.score,
                result.accuracy,
                result.items_completed,
                result.items_total,
                result.duration_seconds
            ),
            bold(),
        )),
    ];

    if !result.mistakes.is_empty() {
        lines.push(Line::default());
        lines.extend(result.mistakes.iter().map(|m| {
            Line::from(Span::styled(
                format!("{}: said {}, wanted {}", m.item, m.got, m.expected),
                dim(),
            ))
        }));
    }

    for notice in notices {
        let Notice::SaveFailed(reason) = notice;
        lines.push(Line::from(Span::styled(
            format!("progress not saved: {reason}"),
            Style::default().fg(Color::Red),
        )));
    }

    let height = lines.len() as u16;
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(centered(area, height), buf);
}

fn centered(area: Rect, height: u16) -> Rect {
    let height = height.min(area.height);
    Rect {
        y: area.y + (area.height - height) / 2,
        height,
        ..area
    }
}
