//! Verbose grouped report.
//!
//! ```text
//!
//! (1) Found 3 duplicate files (size: 4096 Bytes, blake3 9f2c...) in /home/me/photos/:
//!  1: 2023/a.jpg
//!  2: backup/a.jpg
//!  3: inbox/a (1).jpg
//! ```
//!
//! Paths are printed relative to the deepest directory the group shares.

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use yansi::Paint;

use crate::duplicates::DuplicateGroup;
use crate::scanner::HashAlgorithm;

/// Grouped report over already ranked groups.
pub struct ReportOutput<'a> {
    groups: Vec<&'a DuplicateGroup>,
    algorithm: HashAlgorithm,
    color: bool,
}

impl<'a> ReportOutput<'a> {
    /// Create a report. `groups` are printed in the given order.
    #[must_use]
    pub fn new(groups: Vec<&'a DuplicateGroup>, algorithm: HashAlgorithm) -> Self {
        Self {
            groups,
            algorithm,
            color: false,
        }
    }

    /// Highlight group headers with ANSI colors.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for (number, group) in self.groups.iter().enumerate() {
            let prefix = common_prefix(group.paths.iter().map(PathBuf::as_path));
            let header = format!(
                "({}) Found {} duplicate files (size: {} Bytes, {} {}) in {}:",
                number + 1,
                group.len(),
                group.size,
                self.algorithm,
                group.digest_hex(),
                prefix.join("").display()
            );
            writeln!(writer)?;
            if self.color {
                writeln!(writer, "{}", header.cyan().bold())?;
            } else {
                writeln!(writer, "{header}")?;
            }

            for (index, path) in group.sorted_paths().into_iter().enumerate() {
                let shown = path.strip_prefix(&prefix).unwrap_or(path);
                writeln!(writer, "{:2}: {}", index + 1, shown.display())?;
            }
        }
        Ok(())
    }
}

/// Deepest directory containing every path's parent.
///
/// Returns an empty path when the paths share nothing.
#[must_use]
pub fn common_prefix<'p>(paths: impl IntoIterator<Item = &'p Path>) -> PathBuf {
    let mut shared: Option<Vec<Component<'p>>> = None;
    for path in paths {
        let parent: Vec<Component<'p>> = path
            .parent()
            .map(|p| p.components().collect())
            .unwrap_or_default();
        shared = Some(match shared {
            None => parent,
            Some(current) => current
                .into_iter()
                .zip(parent)
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| a)
                .collect(),
        });
    }
    shared.unwrap_or_default().into_iter().collect()
}
