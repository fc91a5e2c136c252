//! Keyboard-driven practice on top of a [`Session`].
//!
//! Keys edit a local text buffer and every edit hands the whole buffer to the
//! session as a new snapshot, the way a text field would.

use std::io;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::debug;

use crate::attempt::AttemptRecord;
use crate::clock::Clock;
use crate::language::ExerciseTextProvider;
use crate::runtime::{EventSource, PracticeEvent, Runner, Ticker};
use crate::session::Session;

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Continue,
    Finished(AttemptRecord),
    Aborted,
}

pub struct Practice<P, C> {
    session: Session<P, C>,
    input: String,
}

impl<P: ExerciseTextProvider, C: Clock> Practice<P, C> {
    pub fn new(session: Session<P, C>) -> Self {
        Self {
            session,
            input: String::new(),
        }
    }

    pub fn session(&self) -> &Session<P, C> {
        &self.session
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn apply(&mut self, event: &PracticeEvent) -> Step {
        if let Some(record) = self.session.record() {
            return Step::Finished(record.clone());
        }

        let finished = match event {
            PracticeEvent::Tick => self.session.on_tick(),
            PracticeEvent::Resize => None,
            PracticeEvent::Key(key) => match self.on_key(key) {
                KeyOutcome::Abort => return Step::Aborted,
                KeyOutcome::Edited => self.session.on_input_changed(&self.input),
                KeyOutcome::Ignored => None,
            },
        };

        finished.map_or(Step::Continue, Step::Finished)
    }

    fn on_key(&mut self, key: &KeyEvent) -> KeyOutcome {
        if key.kind == KeyEventKind::Release {
            return KeyOutcome::Ignored;
        }
        match key.code {
            KeyCode::Esc => KeyOutcome::Abort,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyOutcome::Abort,
            KeyCode::Char(_) if key.modifiers.contains(KeyModifiers::CONTROL) => KeyOutcome::Ignored,
            KeyCode::Char(c) => {
                self.input.push(c);
                KeyOutcome::Edited
            }
            KeyCode::Backspace => match self.input.pop() {
                Some(_) => KeyOutcome::Edited,
                None => KeyOutcome::Ignored,
            },
            _ => KeyOutcome::Ignored,
        }
    }
}

enum KeyOutcome {
    Edited,
    Ignored,
    Abort,
}

/// Drive `practice` until it finishes or the user aborts, calling `redraw`
/// after every handled event.
pub fn run<P, C, E, T, F>(
    practice: &mut Practice<P, C>,
    runner: &mut Runner<E, T>,
    mut redraw: F,
) -> io::Result<Step>
where
    P: ExerciseTextProvider,
    C: Clock,
    E: EventSource,
    T: Ticker,
    F: FnMut(&Practice<P, C>) -> io::Result<()>,
{
    redraw(practice)?;
    loop {
        let event = runner.step();
        let step = practice.apply(&event);
        redraw(practice)?;
        match step {
            Step::Continue => {}
            done => {
                debug!(step = ?done, "practice loop finished");
                return Ok(done);
            }
        }
    }
}
