//! Throttled progress reporting for pipeline stages.
//!
//! The pipeline talks to a single [`ProgressSink`] owned by whoever drives
//! the stages. Parallel hashing workers never touch it; their results are
//! reduced on the driving thread, which is the only writer.
//!
//! # Implementations
//!
//! - [`UpdatePrinter`]: rewrites one line on any `Write` using `\r`, at most
//!   once per `min_interval` unless a flush is forced.
//! - [`SpinnerSink`]: indicatif spinner with the same throttling.
//! - [`SilentSink`]: drops status text, forwards notes to the log.

use std::io::Write;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

/// Default minimum delay between two non-forced refreshes.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(50);

/// Receiver of stage status lines and per-path diagnostics.
pub trait ProgressSink {
    /// Offer a new status line. Implementations may drop it unless `force` is set.
    fn update(&mut self, text: &str, force: bool);

    /// Emit a diagnostic that must not be rate-limited away.
    fn note(&mut self, text: &str);

    /// Terminate the live status line, if any.
    fn finish(&mut self) {}
}

/// Single-line `\r` printer with an explicit refresh interval.
///
/// # Example
///
/// ```
/// use dupsift::progress::{ProgressSink, UpdatePrinter};
/// use std::time::Duration;
///
/// let mut printer = UpdatePrinter::new(Vec::new()).with_min_interval(Duration::ZERO);
/// printer.update("(By Size) 3 Files checked", false);
/// printer.finish();
/// let out = String::from_utf8(printer.into_inner()).unwrap();
/// assert!(out.contains("3 Files checked"));
/// ```
#[derive(Debug)]
pub struct UpdatePrinter<W: Write> {
    out: W,
    min_interval: Duration,
    last_flush: Option<Instant>,
    last_len: usize,
}

impl<W: Write> UpdatePrinter<W> {
    /// Create a printer writing to `out` with the default interval.
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out,
            min_interval: DEFAULT_MIN_INTERVAL,
            last_flush: None,
            last_len: 0,
        }
    }

    /// Set the minimum delay between non-forced refreshes.
    #[must_use]
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// The configured refresh interval.
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn due(&self, force: bool) -> bool {
        force
            || self
                .last_flush
                .map_or(true, |at| at.elapsed() >= self.min_interval)
    }

    fn write_line(&mut self, text: &str) {
        let width = text.chars().count();
        let pad = self.last_len.saturating_sub(width);
        // Output errors on a status line are not worth aborting a scan for.
        let _ = write!(self.out, "\r{text}{:pad$}", "");
        let _ = self.out.flush();
        self.last_len = width;
        self.last_flush = Some(Instant::now());
    }
}

impl<W: Write> ProgressSink for UpdatePrinter<W> {
    fn update(&mut self, text: &str, force: bool) {
        if self.due(force) {
            self.write_line(text);
        }
    }

    fn note(&mut self, text: &str) {
        if self.last_len > 0 {
            let _ = writeln!(self.out);
            self.last_len = 0;
        }
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }

    fn finish(&mut self) {
        if self.last_len > 0 {
            let _ = writeln!(self.out);
            let _ = self.out.flush();
            self.last_len = 0;
        }
    }
}

/// Spinner on stderr driven by indicatif.
pub struct SpinnerSink {
    bar: ProgressBar,
    min_interval: Duration,
    last_flush: Option<Instant>,
}

impl SpinnerSink {
    /// Create a ticking spinner.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Self {
            bar,
            min_interval,
            last_flush: None,
        }
    }
}

impl ProgressSink for SpinnerSink {
    fn update(&mut self, text: &str, force: bool) {
        let due = force
            || self
                .last_flush
                .map_or(true, |at| at.elapsed() >= self.min_interval);
        if due {
            self.bar.set_message(text.to_string());
            self.last_flush = Some(Instant::now());
        }
    }

    fn note(&mut self, text: &str) {
        self.bar.println(text);
    }

    fn finish(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Sink for quiet runs and the interactive surface.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl ProgressSink for SilentSink {
    fn update(&mut self, _text: &str, _force: bool) {}

    fn note(&mut self, text: &str) {
        log::warn!("{text}");
    }
}
