//! Terminal lifecycle and the event loop.
//!
//! The terminal is put in raw mode on the alternate screen for the session
//! and restored on every exit path, panics included.

use std::io::{self, Stdout};
use std::panic;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::{
    cursor, execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use thiserror::Error;

use super::app::App;
use super::events::{EventError, EventHandler};
use super::ui::{list_height, render};

/// Poll timeout, roughly one frame at 60 FPS.
const POLL_TIMEOUT: Duration = Duration::from_millis(16);

/// Error type for TUI operations.
#[derive(Debug, Error)]
pub enum TuiError {
    /// I/O error from terminal operations.
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),

    /// Event handling error.
    #[error("event error: {0}")]
    Event(#[from] EventError),
}

/// Result type for TUI operations.
pub type TuiResult<T> = Result<T, TuiError>;

type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

type PanicHook = Box<dyn Fn(&panic::PanicHookInfo<'_>) + Sync + Send + 'static>;

/// Runs `cleanup` ahead of the previously installed panic hook and puts
/// that hook back on drop.
struct PanicHookGuard {
    previous: Arc<PanicHook>,
}

impl PanicHookGuard {
    fn install(cleanup: fn()) -> Self {
        let previous = Arc::new(panic::take_hook());
        let chained = Arc::clone(&previous);
        panic::set_hook(Box::new(move |info| {
            cleanup();
            (*chained)(info);
        }));
        Self { previous }
    }
}

impl Drop for PanicHookGuard {
    fn drop(&mut self) {
        // set_hook panics on a panicking thread
        if std::thread::panicking() {
            return;
        }
        let previous = Arc::clone(&self.previous);
        panic::set_hook(Box::new(move |info| (*previous)(info)));
    }
}

/// Run the review session until the user quits.
///
/// # Errors
///
/// Returns [`TuiError`] if the terminal cannot be set up, drawn or read.
/// The terminal is restored either way.
pub fn run_tui(app: &mut App) -> TuiResult<()> {
    let _hook = PanicHookGuard::install(restore_terminal);

    let result = setup_terminal().and_then(|mut terminal| event_loop(&mut terminal, app));
    restore_terminal();
    result
}

fn event_loop(terminal: &mut Terminal, app: &mut App) -> TuiResult<()> {
    let events = EventHandler::new(POLL_TIMEOUT);

    while !app.should_quit() {
        app.expire_status(Instant::now());
        terminal.draw(|frame| {
            app.set_visible_rows(list_height(frame.area()));
            render(frame, app);
        })?;

        if let Some(action) = events.next(app.mode())? {
            log::trace!("Action: {action:?}");
            app.handle_action(action);
        }
    }

    log::debug!(
        "Review session ended: {} deleted, {} failed",
        app.deleted_total(),
        app.failed_total()
    );
    Ok(())
}

fn setup_terminal() -> TuiResult<Terminal> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal() {
    let _ = terminal::disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, cursor::Show);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    static CLEANED: AtomicBool = AtomicBool::new(false);
    static PREVIOUS_RAN: AtomicBool = AtomicBool::new(false);

    #[test]
    fn test_panic_hook_guard_chains_then_restores() {
        let outer = panic::take_hook();
        panic::set_hook(Box::new(|_| PREVIOUS_RAN.store(true, Ordering::SeqCst)));

        {
            let _guard = PanicHookGuard::install(|| CLEANED.store(true, Ordering::SeqCst));
            let _ = panic::catch_unwind(|| panic!("during session"));
            assert!(CLEANED.load(Ordering::SeqCst));
            assert!(PREVIOUS_RAN.load(Ordering::SeqCst));
        }

        CLEANED.store(false, Ordering::SeqCst);
        PREVIOUS_RAN.store(false, Ordering::SeqCst);
        let _ = panic::catch_unwind(|| panic!("after session"));
        assert!(!CLEANED.load(Ordering::SeqCst));
        assert!(PREVIOUS_RAN.load(Ordering::SeqCst));

        panic::set_hook(outer);
    }

    #[test]
    fn test_tui_error_display() {
        let err = TuiError::Io(io::Error::other("boom"));
        assert!(err.to_string().contains("terminal I/O error"));
    }
}
