//! Review controller: a navigable group/file tree and its dialogs.
//!
//! # Overview
//!
//! [`App`] wraps a [`ReviewModel`] and adds what the terminal surface needs:
//! the flattened tree, the cursor, scrolling, transient status messages and
//! the confirmation state machine:
//!
//! ```text
//! Browsing -> ConfirmingCommit -> Browsing
//! Browsing -> ConfirmingQuit   -> Terminated | Browsing
//! ```
//!
//! While a confirmation is open only `Confirm` and `Cancel` do anything.
//!
//! # Example
//!
//! ```
//! use dupsift::actions::DeleteConfig;
//! use dupsift::duplicates::DuplicateGroup;
//! use dupsift::scanner::Digest;
//! use dupsift::tui::app::{Action, App, Mode};
//! use std::path::PathBuf;
//!
//! let group = DuplicateGroup::new(
//!     Digest::from_bytes([0; 32]),
//!     10,
//!     vec![PathBuf::from("/a"), PathBuf::from("/b")],
//! );
//! let mut app = App::new(vec![group], DeleteConfig::permanent());
//!
//! app.handle_action(Action::Down);
//! app.handle_action(Action::ToggleMark);
//! assert_eq!(app.model().marked_count(), 1);
//!
//! app.handle_action(Action::Quit);
//! assert_eq!(app.mode(), Mode::ConfirmingQuit);
//! ```

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::model::{MarkError, ReviewModel, SortKey};
use super::theme::Theme;
use crate::actions::delete::DeleteConfig;
use crate::duplicates::DuplicateGroup;

/// How long a transient status message stays visible.
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(2);

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Navigating the tree
    #[default]
    Browsing,
    /// Waiting for a yes/no on deleting the marked files
    ConfirmingCommit,
    /// Waiting for a yes/no on quitting with pending marks
    ConfirmingQuit,
    /// Session over
    Terminated,
}

/// User intention produced by the key mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Move the cursor up
    Up,
    /// Move the cursor down
    Down,
    /// Move up one page
    PageUp,
    /// Move down one page
    PageDown,
    /// Jump to the first row
    Top,
    /// Jump to the last row
    Bottom,
    /// Mark or unmark the selected file
    ToggleMark,
    /// Switch between size and count ordering
    ToggleSort,
    /// Ask to delete the marked files
    Commit,
    /// Ask to leave
    Quit,
    /// Answer yes to the open confirmation
    Confirm,
    /// Answer no to the open confirmation
    Cancel,
}

/// One row of the tree. The group index is a lookup key into the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    /// Header row of a group
    Group {
        /// Index into [`ReviewModel::groups`]
        index: usize,
    },
    /// A member file
    File {
        /// The file
        path: PathBuf,
        /// Index of the owning group
        group: usize,
    },
}

/// Status line text with an optional expiry.
#[derive(Debug, Clone)]
struct StatusMessage {
    text: String,
    expires_at: Option<Instant>,
}

/// Interactive review state.
#[derive(Debug)]
pub struct App {
    model: ReviewModel,
    mode: Mode,
    nodes: Vec<TreeNode>,
    selected: usize,
    scroll_offset: usize,
    visible_rows: usize,
    status: Option<StatusMessage>,
    delete_config: DeleteConfig,
    deleted_total: usize,
    failed_total: usize,
    theme: Theme,
}

impl App {
    /// Create a controller over the pipeline's groups.
    #[must_use]
    pub fn new(groups: Vec<DuplicateGroup>, delete_config: DeleteConfig) -> Self {
        let mut app = Self {
            model: ReviewModel::new(groups),
            mode: Mode::Browsing,
            nodes: Vec::new(),
            selected: 0,
            scroll_offset: 0,
            visible_rows: 20,
            status: None,
            delete_config,
            deleted_total: 0,
            failed_total: 0,
            theme: Theme::default(),
        };
        app.rebuild_tree(None);
        app
    }

    // ==================== Accessors ====================

    /// The review model.
    #[must_use]
    pub fn model(&self) -> &ReviewModel {
        &self.model
    }

    /// Current controller state.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// `true` once the session is over.
    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.mode == Mode::Terminated
    }

    /// Rows of the tree in display order.
    #[must_use]
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Index of the selected row.
    #[must_use]
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// The selected row.
    #[must_use]
    pub fn selected_node(&self) -> Option<&TreeNode> {
        self.nodes.get(self.selected)
    }

    /// First visible row.
    #[must_use]
    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Tell the controller how many rows fit on screen.
    pub fn set_visible_rows(&mut self, rows: usize) {
        self.visible_rows = rows.max(1);
        self.clamp_scroll();
    }

    /// Whether commits delete permanently or to trash.
    #[must_use]
    pub fn delete_config(&self) -> DeleteConfig {
        self.delete_config
    }

    /// Files deleted over the whole session.
    #[must_use]
    pub fn deleted_total(&self) -> usize {
        self.deleted_total
    }

    /// Deletions that failed over the whole session.
    #[must_use]
    pub fn failed_total(&self) -> usize {
        self.failed_total
    }

    /// Use a different palette.
    #[must_use]
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Palette used for rendering.
    #[must_use]
    pub fn theme(&self) -> Theme {
        self.theme
    }

    // ==================== Status Messages ====================

    /// Current status message, if any.
    #[must_use]
    pub fn status_message(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.text.as_str())
    }

    fn flash(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            expires_at: Some(Instant::now() + STATUS_TIMEOUT),
        });
    }

    fn announce(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            expires_at: None,
        });
    }

    /// Drop a transient message whose time is up.
    pub fn expire_status(&mut self, now: Instant) {
        if self
            .status
            .as_ref()
            .and_then(|s| s.expires_at)
            .is_some_and(|at| now >= at)
        {
            self.status = None;
        }
    }

    // ==================== Dialogs ====================

    /// Text of the open confirmation, if any.
    #[must_use]
    pub fn prompt(&self) -> Option<String> {
        match self.mode {
            Mode::ConfirmingCommit => {
                let count = self.model.marked_count();
                let size = super::ui::format_size(self.model.marked_bytes());
                Some(if self.delete_config.permanent {
                    format!("Permanently delete {count} file(s) ({size})?")
                } else {
                    format!("Move {count} file(s) ({size}) to the trash?")
                })
            }
            Mode::ConfirmingQuit => Some(
                "You have files marked for deletion. Are you sure you want to quit?".to_string(),
            ),
            Mode::Browsing | Mode::Terminated => None,
        }
    }

    // ==================== Tree ====================

    /// Rebuild rows from the model's current order, keeping the cursor on
    /// `keep` when it is still present. File rows are matched by path since
    /// group indices shift when a commit drops groups.
    fn rebuild_tree(&mut self, keep: Option<TreeNode>) {
        let order = self.model.sorted_indices(self.model.sort_key());
        self.nodes.clear();
        for index in order {
            self.nodes.push(TreeNode::Group { index });
            if let Some(group) = self.model.group(index) {
                self.nodes.extend(group.paths.iter().map(|path| TreeNode::File {
                    path: path.clone(),
                    group: index,
                }));
            }
        }

        if let Some(keep) = keep {
            let found = self.nodes.iter().position(|n| match (n, &keep) {
                (TreeNode::File { path, .. }, TreeNode::File { path: kept, .. }) => path == kept,
                _ => *n == keep,
            });
            if let Some(position) = found {
                self.selected = position;
            }
        }
        self.selected = self.selected.min(self.nodes.len().saturating_sub(1));
        self.clamp_scroll();
    }

    // ==================== Navigation ====================

    fn move_to(&mut self, row: usize) {
        self.selected = row.min(self.nodes.len().saturating_sub(1));
        self.clamp_scroll();
    }

    fn clamp_scroll(&mut self) {
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + self.visible_rows {
            self.scroll_offset = self.selected + 1 - self.visible_rows;
        }
    }

    // ==================== Actions ====================

    fn toggle_selected_mark(&mut self) {
        let Some(TreeNode::File { path, .. }) = self.selected_node().cloned() else {
            return;
        };
        match self.model.toggle_mark(&path) {
            Ok(_) => {}
            Err(e @ MarkError::LastCopy(_)) => self.flash(e.to_string()),
            Err(e) => log::debug!("Mark ignored: {e}"),
        }
    }

    fn toggle_sort(&mut self) {
        let keep = self.selected_node().cloned();
        self.model.toggle_sort();
        self.rebuild_tree(keep);
    }

    fn commit(&mut self) {
        let keep = self
            .selected_node()
            .filter(|n| matches!(n, TreeNode::File { .. }))
            .cloned();
        let report = self.model.commit(&self.delete_config);
        self.deleted_total += report.result.success_count();
        self.failed_total += report.result.failure_count();
        for (path, error) in &report.result.failures {
            log::warn!("Could not delete {}: {}", path.display(), error);
        }
        self.announce(report.result.summary());
        self.rebuild_tree(keep);
    }

    /// Apply an action. Returns `true` when the session should end.
    pub fn handle_action(&mut self, action: Action) -> bool {
        match self.mode {
            Mode::Browsing => self.browse(action),
            Mode::ConfirmingCommit => match action {
                Action::Confirm => {
                    self.commit();
                    self.mode = Mode::Browsing;
                }
                Action::Cancel => self.mode = Mode::Browsing,
                _ => {}
            },
            Mode::ConfirmingQuit => match action {
                Action::Confirm => self.mode = Mode::Terminated,
                Action::Cancel => self.mode = Mode::Browsing,
                _ => {}
            },
            Mode::Terminated => {}
        }
        self.should_quit()
    }

    fn browse(&mut self, action: Action) {
        let page = self.visible_rows.max(1);
        match action {
            Action::Up => self.move_to(self.selected.saturating_sub(1)),
            Action::Down => self.move_to(self.selected + 1),
            Action::PageUp => self.move_to(self.selected.saturating_sub(page)),
            Action::PageDown => self.move_to(self.selected + page),
            Action::Top => self.move_to(0),
            Action::Bottom => self.move_to(usize::MAX),
            Action::ToggleMark => self.toggle_selected_mark(),
            Action::ToggleSort => self.toggle_sort(),
            Action::Commit => {
                if self.model.marked_count() == 0 {
                    self.flash("No files to delete.");
                } else {
                    self.mode = Mode::ConfirmingCommit;
                }
            }
            Action::Quit => {
                self.mode = if self.model.marked_count() > 0 {
                    Mode::ConfirmingQuit
                } else {
                    Mode::Terminated
                };
            }
            Action::Confirm | Action::Cancel => {}
        }
    }

    /// `true` if `path` is marked.
    #[must_use]
    pub fn is_marked(&self, path: &Path) -> bool {
        self.model.is_marked(path)
    }

    /// Current sort key.
    #[must_use]
    pub fn sort_key(&self) -> SortKey {
        self.model.sort_key()
    }
}
