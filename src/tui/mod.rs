//! Interactive review of the duplicate set.
//!
//! - [`model`]: marks, sort order and commit over the groups
//! - [`app`]: tree navigation and the confirmation state machine
//! - [`events`]: key bindings
//! - [`ui`]: ratatui rendering
//! - [`run`]: terminal setup and the event loop
//!
//! Data flows one way: key, then [`Action`], then [`App`], then a redraw.

pub mod app;
pub mod events;
pub mod model;
pub mod run;
pub mod theme;
pub mod ui;

pub use app::{Action, App, Mode, TreeNode};
pub use events::{map_key, EventHandler};
pub use model::{CommitReport, MarkError, ReviewModel, SortKey};
pub use run::{run_tui, TuiError};
pub use theme::Theme;
