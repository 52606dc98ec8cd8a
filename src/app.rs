use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::warn;

use crate::clock::Clock;
use crate::engine::{Input, Step};
use crate::host::{GameHost, HostView};
use crate::store::PersistenceService;
use crate::variant::Family;

/// What the play loop should do after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitType {
    Continue,
    Quit,
}

/// Terminal front end state: the host plus whatever the status line shows.
pub struct App<S: PersistenceService, C: Clock> {
    pub host: GameHost<S, C>,
    pub status: Option<String>,
}

impl<S: PersistenceService, C: Clock> App<S, C> {
    pub fn new(host: GameHost<S, C>) -> Self {
        Self { host, status: None }
    }

    pub fn start(&mut self) {
        self.status = match self.host.start() {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "could not start game");
                Some(e.to_string())
            }
        };
    }

    pub fn on_tick(&mut self) -> Step {
        self.host.on_tick()
    }

    pub fn on_key(&mut self, key: KeyEvent) -> ExitType {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return ExitType::Quit;
        }

        match self.host.view().clone() {
            HostView::Idle => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => return ExitType::Quit,
                KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('r') => self.start(),
                _ => {}
            },
            HostView::Summary(_) => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => return ExitType::Quit,
                KeyCode::Char('r') => {
                    self.status = self.host.play_again().err().map(|e| e.to_string());
                }
                _ => {}
            },
            HostView::Playing => match key.code {
                KeyCode::Esc => self.host.go_back(),
                code => {
                    self.play_key(code);
                }
            },
        }
        ExitType::Continue
    }

    fn play_key(&mut self, code: KeyCode) -> Step {
        let Some(family) = self.host.game().map(|g| g.variant().family()) else {
            return Step::Ignored;
        };
        match (family, code) {
            (Family::Choice, KeyCode::Char(c @ '1'..='9')) => {
                self.host.choose_index(c as usize - '1' as usize)
            }
            (Family::Matching, KeyCode::Char(c @ 'a'..='z')) => {
                self.host.choose_index(c as usize - 'a' as usize)
            }
            (Family::SelfPaced, KeyCode::Char(' ') | KeyCode::Enter) => {
                self.host.handle_input(Input::Done)
            }
            // One key toggles the recorder: a second start is ignored, so stop.
            (Family::Recording, KeyCode::Char(' ') | KeyCode::Enter) => {
                match self.host.handle_input(Input::StartRecording) {
                    Step::Ignored => self.host.handle_input(Input::Done),
                    step => step,
                }
            }
            _ => Step::Ignored,
        }
    }
}

/// Letter shown on memory card `idx`.
pub fn card_key(idx: usize) -> char {
    (b'a' + (idx % 26) as u8) as char
}
