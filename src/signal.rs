//! Ctrl+C handling.
//!
//! A shared `AtomicBool` is set when the user interrupts. Pipeline stages
//! are never cancelled midway; the flag is consulted between stages and the
//! run ends with exit code 130.
//!
//! ```rust,no_run
//! use dupsift::signal::install_handler;
//!
//! let handler = install_handler().expect("signal handler");
//! let flag = handler.get_flag();
//! // hand `flag` to PipelineConfig::with_shutdown_flag
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone of the flag for the pipeline.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C handler, or reuse the one already installed.
///
/// # Errors
///
/// Returns `SignalError::InstallFailed` if the OS hook cannot be registered
/// and no handler was installed earlier in this process.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(
            std::io::stderr(),
            "\nInterrupted. Stopping after the current stage..."
        );
        log::info!("Shutdown signal received");
    })?;

    Ok(GLOBAL_HANDLER.get_or_init(|| handler).clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_clears_flag() {
        let handler = ShutdownHandler::new();
        let flag = handler.get_flag();
        assert!(!flag.load(Ordering::SeqCst));
        flag.store(true, Ordering::SeqCst);
        handler.reset();
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_flag_is_shared_between_clones() {
        let handler = ShutdownHandler::new();
        let cloned = handler.clone();
        let flag = handler.get_flag();

        flag.store(true, Ordering::SeqCst);
        assert!(handler.get_flag().load(Ordering::SeqCst));
        assert!(cloned.get_flag().load(Ordering::SeqCst));
    }

    #[test]
    fn test_shutdown_handler_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ShutdownHandler>();
    }
}
