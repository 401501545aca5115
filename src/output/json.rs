//! Machine-readable duplicate set.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "complete": true,
//!   "algorithm": "blake3",
//!   "groups": [
//!     {
//!       "digest": "9f2c...",
//!       "size": 1024,
//!       "paths": ["/data/a", "/data/b"]
//!     }
//!   ],
//!   "summary": {
//!     "groups": 1,
//!     "duplicate_files": 2,
//!     "reclaimable_bytes": 1024,
//!     "listed": 40,
//!     "skipped": 0
//!   }
//! }
//! ```
//!
//! `complete` is `false` when fast-mode caps made the set a lower bound.

use std::io::Write;

use serde::Serialize;

use crate::duplicates::{DuplicateGroup, PipelineResult};
use crate::scanner::HashAlgorithm;

/// Run totals.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Number of groups in the document
    pub groups: usize,
    /// Paths across those groups
    pub duplicate_files: usize,
    /// Bytes freed by keeping one copy per group
    pub reclaimable_bytes: u64,
    /// Candidates the listing produced
    pub listed: usize,
    /// Paths dropped because they could not be read
    pub skipped: usize,
}

/// Complete JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    /// `false` when more duplicates may exist
    pub complete: bool,
    /// Digest algorithm used for `digest`
    pub algorithm: HashAlgorithm,
    /// Duplicate groups
    pub groups: Vec<&'a DuplicateGroup>,
    /// Totals
    pub summary: JsonSummary,
}

impl<'a> JsonOutput<'a> {
    /// Build the document from a pipeline result.
    ///
    /// `groups` selects and orders what is emitted. Totals describe that
    /// selection, while `listed` and `skipped` describe the whole run.
    #[must_use]
    pub fn new(
        result: &PipelineResult,
        groups: Vec<&'a DuplicateGroup>,
        algorithm: HashAlgorithm,
    ) -> Self {
        let summary = JsonSummary {
            groups: groups.len(),
            duplicate_files: groups.iter().map(|g| g.len()).sum(),
            reclaimable_bytes: groups.iter().map(|g| g.wasted_bytes()).sum(),
            listed: result.listed,
            skipped: result.skipped(),
        };
        Self {
            complete: !result.is_lower_bound(),
            algorithm,
            groups,
            summary,
        }
    }

    /// Compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::Completeness;
    use crate::scanner::Digest;
    use std::path::PathBuf;

    fn result(completeness: Completeness) -> PipelineResult {
        PipelineResult {
            groups: vec![DuplicateGroup::new(
                Digest::from_bytes([0x0f; 32]),
                10,
                vec![PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")],
            )],
            completeness,
            stages: Vec::new(),
            listed: 7,
            listing_skipped: 1,
        }
    }

    #[test]
    fn test_document_fields() {
        let result = result(Completeness::Exhaustive);
        let output = JsonOutput::new(
            &result,
            result.groups.iter().collect(),
            HashAlgorithm::Blake3,
        );
        let value: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();

        assert_eq!(value["complete"], true);
        assert_eq!(value["algorithm"], "blake3");
        assert_eq!(value["groups"][0]["digest"], "0f".repeat(32));
        assert_eq!(value["groups"][0]["size"], 10);
        assert_eq!(value["groups"][0]["paths"][2], "/c");
        assert_eq!(value["summary"]["duplicate_files"], 3);
        assert_eq!(value["summary"]["reclaimable_bytes"], 20);
        assert_eq!(value["summary"]["listed"], 7);
        assert_eq!(value["summary"]["skipped"], 1);
    }

    #[test]
    fn test_lower_bound_is_incomplete() {
        let result = result(Completeness::LowerBound);
        let output = JsonOutput::new(&result, Vec::new(), HashAlgorithm::Sha256);
        let value: serde_json::Value =
            serde_json::from_str(&output.to_json_pretty().unwrap()).unwrap();
        assert_eq!(value["complete"], false);
        assert_eq!(value["summary"]["groups"], 0);
    }
}
