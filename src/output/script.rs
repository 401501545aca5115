//! Tab-separated `group-index<TAB>path` stream.
//!
//! Indices are zero-based and paths within a group are sorted, so the
//! output is stable for a given duplicate set:
//!
//! ```text
//! 0	/data/a/orig
//! 0	/data/z/copy
//! 1	/music/x.mp3
//! 1	/music/y.mp3
//! ```

use std::io::Write;

use crate::duplicates::DuplicateGroup;

/// Script-friendly listing.
pub struct ScriptOutput<'a> {
    groups: Vec<&'a DuplicateGroup>,
}

impl<'a> ScriptOutput<'a> {
    /// Create the listing over groups in the given order.
    #[must_use]
    pub fn new(groups: Vec<&'a DuplicateGroup>) -> Self {
        Self { groups }
    }

    /// Write one line per path.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for (index, group) in self.groups.iter().enumerate() {
            for path in group.sorted_paths() {
                writeln!(writer, "{index}\t{}", path.display())?;
            }
        }
        Ok(())
    }
}
