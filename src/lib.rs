//! dupsift - progressive duplicate file finder
//!
//! Files under one or more roots are narrowed by size, then by a digest of
//! their first block, then by a digest of their full content. In fast mode
//! each stage keeps only the largest groups so the biggest duplicate sets
//! surface early, at the cost of a lower-bound result.
//!
//! Results can be reviewed in an interactive tree, printed as a report,
//! emitted for scripts or as JSON, or pruned in batch by keeping the newest
//! copy of every group.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;
pub mod tui;

use std::io::{self, IsTerminal, Write};

use anyhow::Context;

use crate::actions::{keep_newest, DeleteConfig, DeletionPlan};
use crate::cli::{Cli, Commands, OutputFormat, ScanArgs};
use crate::config::Config;
use crate::duplicates::{find_in_roots, PipelineResult};
use crate::error::ExitCode;
use crate::output::write_results;
use crate::progress::{ProgressSink, SilentSink, SpinnerSink, UpdatePrinter};
use crate::tui::{run_tui, App, Theme};

/// `true` if errors should be printed as JSON, i.e. the effective output
/// format after config file, environment and flags is JSON.
#[must_use]
pub fn wants_json_errors(cli: &Cli) -> bool {
    let Commands::Scan(args) = &cli.command else {
        return false;
    };
    match args.output {
        Some(format) => format == OutputFormat::Json,
        None => Config::load(cli.config.as_deref())
            .is_ok_and(|config| config.output == OutputFormat::Json),
    }
}

/// Run the parsed command line.
///
/// # Errors
///
/// Returns configuration, scan, output and terminal errors. Interrupted
/// scans surface as [`duplicates::FinderError::Interrupted`].
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let mut config =
        Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(ExitCode::Success)
        }
        Commands::Scan(args) => {
            config.apply_scan_args(&args);
            run_scan(&args, &config, cli.quiet, cli.no_color)
        }
    }
}

fn run_scan(
    args: &ScanArgs,
    config: &Config,
    quiet: bool,
    no_color: bool,
) -> anyhow::Result<ExitCode> {
    let handler = signal::install_handler().context("Failed to install Ctrl+C handler")?;
    let pipeline_config = config
        .pipeline_config()
        .with_shutdown_flag(handler.get_flag());

    log::info!(
        "Scanning {} root(s): fast={}, method={:?}, top={:?}, algorithm={}",
        args.paths.len(),
        config.fast,
        config.method,
        config.top_limit(),
        config.algorithm
    );

    let mut sink = make_sink(config, quiet, no_color);
    let result = find_in_roots(
        &args.paths,
        config.walker_config(),
        pipeline_config,
        sink.as_mut(),
    )?;
    drop(sink);

    for stage in &result.stages {
        log::debug!(
            "{}: {} kept, {} capped, {} skipped",
            stage.name,
            stage.kept_groups,
            stage.capped_groups,
            stage.stats.skipped
        );
    }
    log::info!(
        "{} group(s), {} reclaimable",
        result.groups.len(),
        bytesize::ByteSize::b(result.reclaimable_bytes())
    );

    let delete_config = if config.trash {
        DeleteConfig::trash()
    } else {
        DeleteConfig::permanent()
    };

    let code = if args.delete_older {
        delete_older(&result, &delete_config, args.dry_run)?
    } else {
        emit(&result, config, no_color, delete_config)?
    };

    if !quiet {
        eprintln!("{}", result.summary_line());
    }
    Ok(code)
}

fn make_sink(config: &Config, quiet: bool, no_color: bool) -> Box<dyn ProgressSink> {
    if quiet || !io::stderr().is_terminal() {
        Box::new(SilentSink)
    } else if no_color {
        Box::new(UpdatePrinter::new(io::stderr()).with_min_interval(config.progress_interval()))
    } else {
        Box::new(SpinnerSink::new(config.progress_interval()))
    }
}

fn emit(
    result: &PipelineResult,
    config: &Config,
    no_color: bool,
    delete_config: DeleteConfig,
) -> anyhow::Result<ExitCode> {
    if config.output == OutputFormat::Tui {
        if result.groups.is_empty() {
            return Ok(ExitCode::Success);
        }
        let mut app = App::new(result.groups.clone(), delete_config).with_theme(Theme::detect());
        run_tui(&mut app).context("Interactive review failed")?;
        if app.deleted_total() > 0 || app.failed_total() > 0 {
            eprintln!(
                "Deleted {} file(s), {} failed.",
                app.deleted_total(),
                app.failed_total()
            );
        }
        return Ok(ExitCode::from_deletion_failures(app.failed_total()));
    }

    let color = !no_color && io::stdout().is_terminal();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_results(
        &mut out,
        result,
        config.output,
        config.top_limit(),
        config.algorithm,
        color,
    )?;
    out.flush()?;
    Ok(ExitCode::Success)
}

fn delete_older(
    result: &PipelineResult,
    delete_config: &DeleteConfig,
    dry_run: bool,
) -> anyhow::Result<ExitCode> {
    let plan = keep_newest(&result.groups);

    if dry_run {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        write_plan(&plan, &mut out)?;
        out.flush()?;
        return Ok(ExitCode::Success);
    }

    let outcome = plan.execute(delete_config);
    for (path, reason) in &outcome.failures {
        log::warn!("Failed to delete {}: {reason}", path.display());
    }
    eprintln!(
        "{} ({} freed)",
        outcome.summary(),
        bytesize::ByteSize::b(outcome.bytes_freed)
    );
    Ok(ExitCode::from_deletion_failures(outcome.failure_count()))
}

/// `keep`/`delete` lines for a dry run.
fn write_plan<W: Write>(plan: &DeletionPlan, writer: &mut W) -> io::Result<()> {
    for group in &plan.groups {
        writeln!(writer, "keep\t{}", group.keep.display())?;
        for path in &group.delete {
            writeln!(writer, "delete\t{}", path.display())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::PlannedGroup;
    use std::path::PathBuf;

    #[test]
    fn test_write_plan_lines() {
        let plan = DeletionPlan {
            groups: vec![PlannedGroup {
                keep: PathBuf::from("/new"),
                delete: vec![PathBuf::from("/old1"), PathBuf::from("/old2")],
            }],
        };
        let mut out = Vec::new();
        write_plan(&plan, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "keep\t/new\ndelete\t/old1\ndelete\t/old2\n"
        );
    }
}
