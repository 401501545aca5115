//! Non-interactive renderings of the duplicate set.
//!
//! - [`report`]: grouped, human-readable, with sizes and hex digests
//! - [`script`]: `index<TAB>path` lines for piping into other tools
//! - [`json`]: machine-readable document with completeness and totals

pub mod json;
pub mod report;
pub mod script;

use std::io::Write;

pub use json::JsonOutput;
pub use report::{common_prefix, ReportOutput};
pub use script::ScriptOutput;

use crate::cli::OutputFormat;
use crate::duplicates::PipelineResult;
use crate::scanner::HashAlgorithm;

/// Write the `top` highest ranked groups in a streamed format.
///
/// Every format applies the same ranking and limit, so a fast run asked
/// for N groups never emits more than N. [`OutputFormat::Tui`] has no
/// stream rendering and writes nothing.
///
/// # Errors
///
/// Returns any error from the writer or from JSON serialization.
pub fn write_results<W: Write>(
    writer: &mut W,
    result: &PipelineResult,
    format: OutputFormat,
    top: Option<usize>,
    algorithm: HashAlgorithm,
    color: bool,
) -> std::io::Result<()> {
    let groups = result.ranked(top);
    match format {
        OutputFormat::Tui => Ok(()),
        OutputFormat::Report => ReportOutput::new(groups, algorithm)
            .with_color(color)
            .write_to(writer),
        OutputFormat::Script => ScriptOutput::new(groups).write_to(writer),
        OutputFormat::Json => JsonOutput::new(result, groups, algorithm).write_to(writer),
    }
}
