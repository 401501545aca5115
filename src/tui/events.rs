//! Keyboard input to [`Action`] translation.
//!
//! [`map_key`] is a pure function of the controller mode and the key, so
//! the bindings can be tested without a terminal. [`EventHandler`] polls
//! crossterm and feeds keys through it.
//!
//! | Key                   | Browsing      | Confirming |
//! |-----------------------|---------------|------------|
//! | Up / k, Down / j      | move          |            |
//! | PageUp / PageDown     | page          |            |
//! | Home / g, End / G     | first / last  |            |
//! | Delete / Space        | toggle mark   |            |
//! | Tab                   | toggle sort   |            |
//! | F10 / c               | commit        |            |
//! | q / Esc / Ctrl+C      | quit          |            |
//! | y / Enter             |               | confirm    |
//! | n / Esc               |               | cancel     |
//!
//! Ctrl+C answers yes to the quit question and no to the commit question.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::app::{Action, Mode};

/// Error type for event polling.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// Reading from the terminal failed.
    #[error("failed to read terminal event: {0}")]
    Io(#[from] std::io::Error),
}

/// Map a key press to an action for the given mode.
#[must_use]
pub fn map_key(mode: Mode, key: KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let ctrl_c = key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');

    match mode {
        Mode::Browsing => {
            if ctrl_c {
                return Some(Action::Quit);
            }
            match key.code {
                KeyCode::Up | KeyCode::Char('k') => Some(Action::Up),
                KeyCode::Down | KeyCode::Char('j') => Some(Action::Down),
                KeyCode::PageUp => Some(Action::PageUp),
                KeyCode::PageDown => Some(Action::PageDown),
                KeyCode::Home | KeyCode::Char('g') => Some(Action::Top),
                KeyCode::End | KeyCode::Char('G') => Some(Action::Bottom),
                KeyCode::Delete | KeyCode::Char(' ') => Some(Action::ToggleMark),
                KeyCode::Tab => Some(Action::ToggleSort),
                KeyCode::F(10) | KeyCode::Char('c') => Some(Action::Commit),
                KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
                _ => None,
            }
        }
        Mode::ConfirmingCommit | Mode::ConfirmingQuit => {
            if ctrl_c {
                return Some(if mode == Mode::ConfirmingQuit {
                    Action::Confirm
                } else {
                    Action::Cancel
                });
            }
            match key.code {
                KeyCode::Char('y' | 'Y') | KeyCode::Enter => Some(Action::Confirm),
                KeyCode::Char('n' | 'N') | KeyCode::Esc => Some(Action::Cancel),
                _ => None,
            }
        }
        Mode::Terminated => None,
    }
}

/// Polls crossterm for key events.
#[derive(Debug, Clone, Copy)]
pub struct EventHandler {
    timeout: Duration,
}

impl EventHandler {
    /// Create a handler that waits at most `timeout` per poll.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Wait for the next key and map it.
    ///
    /// Returns `Ok(None)` on timeout, resize, mouse events and unbound keys.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Io`] if the terminal cannot be read.
    pub fn next(&self, mode: Mode) -> Result<Option<Action>, EventError> {
        if !event::poll(self.timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) => Ok(map_key(mode, key)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_browsing_bindings() {
        let cases = [
            (KeyCode::Up, Action::Up),
            (KeyCode::Char('j'), Action::Down),
            (KeyCode::Delete, Action::ToggleMark),
            (KeyCode::Char(' '), Action::ToggleMark),
            (KeyCode::Tab, Action::ToggleSort),
            (KeyCode::F(10), Action::Commit),
            (KeyCode::Char('q'), Action::Quit),
            (KeyCode::Esc, Action::Quit),
            (KeyCode::End, Action::Bottom),
        ];
        for (code, action) in cases {
            assert_eq!(map_key(Mode::Browsing, press(code)), Some(action), "{code:?}");
        }
        assert_eq!(map_key(Mode::Browsing, press(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_confirm_bindings() {
        for mode in [Mode::ConfirmingCommit, Mode::ConfirmingQuit] {
            assert_eq!(map_key(mode, press(KeyCode::Char('y'))), Some(Action::Confirm));
            assert_eq!(map_key(mode, press(KeyCode::Enter)), Some(Action::Confirm));
            assert_eq!(map_key(mode, press(KeyCode::Char('n'))), Some(Action::Cancel));
            assert_eq!(map_key(mode, press(KeyCode::Esc)), Some(Action::Cancel));
            // Browsing keys are inert while a question is open.
            assert_eq!(map_key(mode, press(KeyCode::Delete)), None);
            assert_eq!(map_key(mode, press(KeyCode::F(10))), None);
        }
    }

    #[test]
    fn test_ctrl_c() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(Mode::Browsing, key), Some(Action::Quit));
        assert_eq!(map_key(Mode::ConfirmingQuit, key), Some(Action::Confirm));
        assert_eq!(map_key(Mode::ConfirmingCommit, key), Some(Action::Cancel));
    }

    #[test]
    fn test_release_events_ignored() {
        let mut key = press(KeyCode::Char('q'));
        key.kind = KeyEventKind::Release;
        assert_eq!(map_key(Mode::Browsing, key), None);
    }

    #[test]
    fn test_terminated_ignores_everything() {
        assert_eq!(map_key(Mode::Terminated, press(KeyCode::Char('q'))), None);
    }
}
