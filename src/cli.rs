//! Command-line interface definitions.
//!
//! Global options (verbosity, color, config file) come first, followed by a
//! subcommand. Scan flags left unset fall back to the layered configuration.
//!
//! # Example
//!
//! ```bash
//! # Review duplicates interactively (default)
//! dupsift scan ~/Pictures ~/Backup
//!
//! # Quickly surface the 5 biggest duplicate groups
//! dupsift scan ~/Pictures --fast --top 5 --output report
//!
//! # Keep the newest copy of everything, trashing the rest
//! dupsift scan ~/Downloads --delete-older --trash
//!
//! # Show the merged configuration
//! dupsift config
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::duplicates::Method;
use crate::scanner::HashAlgorithm;

/// Progressive duplicate file finder with interactive review.
///
/// Files are narrowed by size, then by a partial digest, then by a full
/// content digest. In fast mode each stage keeps only the most promising
/// groups so the largest duplicate sets surface early.
#[derive(Debug, Parser)]
#[command(name = "dupsift")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Read configuration from this TOML file instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Find duplicate files under one or more directories
    Scan(ScanArgs),
    /// Print the effective configuration as TOML
    Config,
}

/// Arguments for the scan subcommand.
#[derive(Debug, Default, Args)]
pub struct ScanArgs {
    /// Directories to scan
    #[arg(value_name = "PATHS", required = true)]
    pub paths: Vec<PathBuf>,

    /// Number of groups targeted by fast mode and shown by the report (0 = all)
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Show every duplicate group (same as --top 0)
    #[arg(short, long, conflicts_with = "top")]
    pub all: bool,

    /// Keep only the most promising groups at each stage
    ///
    /// The result is a lower bound: more duplicates may exist.
    #[arg(long)]
    pub fast: bool,

    /// Stage sequence: prefilter adds a partial-digest stage before full hashing
    #[arg(long, value_enum, value_name = "METHOD")]
    pub method: Option<Method>,

    /// Include hidden files and directories
    #[arg(long)]
    pub hidden: bool,

    /// Include zero-length files
    #[arg(long)]
    pub empty: bool,

    /// Minimum file size to consider (e.g., 10K, 1MiB)
    ///
    /// Supports suffixes: B, K, KB, KiB, M, MB, MiB, G, GB, GiB, T, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Content digest algorithm
    #[arg(long, value_enum, value_name = "ALGORITHM")]
    pub algorithm: Option<HashAlgorithm>,

    /// Number of threads for the hashing stages
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// In every group keep the newest copy and delete the others
    #[arg(long)]
    pub delete_older: bool,

    /// Move deleted files to the trash instead of removing them permanently
    #[arg(long)]
    pub trash: bool,

    /// With --delete-older, print what would be deleted and stop
    #[arg(long, requires = "delete_older")]
    pub dry_run: bool,
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Interactive review of the duplicate tree
    #[default]
    Tui,
    /// Grouped human-readable report
    Report,
    /// `index<TAB>path` lines for scripting
    Script,
    /// JSON document
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Tui => write!(f, "tui"),
            OutputFormat::Report => write!(f, "report"),
            OutputFormat::Script => write!(f, "script"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Decimal suffixes (`K`, `KB`) are powers of 1000 and binary suffixes
/// (`KiB`) powers of 1024. Case-insensitive. Bare numbers are bytes.
///
/// # Examples
///
/// ```
/// use dupsift::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("10K").unwrap(), 10_000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "K" | "KB" => 1_000,
        "KIB" => 1 << 10,
        "M" | "MB" => 1_000_000,
        "MIB" => 1 << 20,
        "G" | "GB" => 1_000_000_000,
        "GIB" => 1 << 30,
        "T" | "TB" => 1_000_000_000_000,
        "TIB" => 1 << 40,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_units() {
        assert_eq!(parse_size("0").unwrap(), 0);
        assert_eq!(parse_size("512B").unwrap(), 512);
        assert_eq!(parse_size("10K").unwrap(), 10_000);
        assert_eq!(parse_size("1kib").unwrap(), 1_024);
        assert_eq!(parse_size("2MB").unwrap(), 2_000_000);
        assert_eq!(parse_size("1GiB").unwrap(), 1_073_741_824);
        assert_eq!(parse_size("1TiB").unwrap(), 1_099_511_627_776);
    }

    #[test]
    fn test_parse_size_fractional_and_spacing() {
        assert_eq!(parse_size("1.5MB").unwrap(), 1_500_000);
        assert_eq!(parse_size("  1 MB ").unwrap(), 1_000_000);
    }

    #[test]
    fn test_parse_size_errors() {
        assert!(parse_size("").is_err());
        assert!(parse_size("abc").is_err());
        assert!(parse_size("1XB").is_err());
        assert!(parse_size("-1MB").is_err());
    }

    #[test]
    fn test_cli_parse_scan_defaults() {
        let cli = Cli::try_parse_from(["dupsift", "scan", "/a", "/b"]).unwrap();
        assert_eq!(cli.verbose, 0);
        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(args.paths, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
                assert_eq!(args.top, None);
                assert!(!args.fast);
                assert_eq!(args.output, None);
            }
            Commands::Config => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_cli_parse_scan_options() {
        let cli = Cli::try_parse_from([
            "dupsift",
            "-vv",
            "scan",
            "/data",
            "--fast",
            "--top",
            "5",
            "--method",
            "thorough",
            "--algorithm",
            "sha256",
            "--min-size",
            "1KiB",
            "--output",
            "script",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Scan(args) => {
                assert!(args.fast);
                assert_eq!(args.top, Some(5));
                assert_eq!(args.method, Some(Method::Thorough));
                assert_eq!(args.algorithm, Some(HashAlgorithm::Sha256));
                assert_eq!(args.min_size, Some(1024));
                assert_eq!(args.output, Some(OutputFormat::Script));
            }
            Commands::Config => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_cli_requires_a_path() {
        assert!(Cli::try_parse_from(["dupsift", "scan"]).is_err());
    }

    #[test]
    fn test_cli_conflicts() {
        assert!(Cli::try_parse_from(["dupsift", "-v", "-q", "scan", "/p"]).is_err());
        assert!(Cli::try_parse_from(["dupsift", "scan", "/p", "--all", "--top", "2"]).is_err());
        assert!(Cli::try_parse_from(["dupsift", "scan", "/p", "--dry-run"]).is_err());
    }

    #[test]
    fn test_cli_config_subcommand() {
        let cli = Cli::try_parse_from(["dupsift", "--config", "/etc/d.toml", "config"]).unwrap();
        assert!(matches!(cli.command, Commands::Config));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/d.toml")));
    }
}
