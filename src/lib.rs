//! dupesift - near-duplicate media grouping
//!
//! Scans a directory tree, fingerprints images perceptually, groups files
//! whose fingerprints are close, and resolves each group to a single keeper
//! using a ranked list of folders. The result is persisted as a CSV table
//! that can be reviewed, edited, and finally executed as deletions.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod record;
pub mod scanner;
pub mod signal;

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use bytesize::ByteSize;
use yansi::Paint;

use crate::actions::{delete_marked, DeleteConfig};
use crate::cli::{Cli, Commands, DeleteArgs, MarkArgs, PriorityArgs, ScanArgs, StatusArgs};
use crate::config::Config;
use crate::duplicates::{
    apply_priority, cluster, collect_groups, derive_statuses, set_marked, GroupStatus,
    GroupingStats,
};
use crate::error::ExitCode;
use crate::output::{load_table, JsonReport, TableOutput};
use crate::progress::Progress;
use crate::record::FileRecord;
use crate::scanner::{ScanConfig, Scanner, WalkerConfig};

/// Run the command described by `cli`.
///
/// # Errors
///
/// Returns an error when configuration, scanning, or table I/O fails. An
/// interrupted scan surfaces as [`scanner::ScanError::Interrupted`] in the
/// error chain; see [`ExitCode::for_error`].
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan(args) => run_scan(args, config, cli.quiet),
        Commands::Status(args) => run_status(args, &config),
        Commands::Mark(args) => run_mark(args, &config, cli.quiet),
        Commands::Priority(args) => run_priority(args, &config, cli.quiet),
        Commands::Delete(args) => run_delete(args, &config, cli.quiet),
        Commands::Config => run_config(cli.config.as_deref(), &config),
    }
}

fn table_path(explicit: Option<PathBuf>, config: &Config) -> PathBuf {
    explicit.unwrap_or_else(|| config.table_path.clone())
}

fn load(path: &Path) -> Result<Vec<FileRecord>> {
    load_table(path).with_context(|| format!("Failed to read table {}", path.display()))
}

fn save(records: &[FileRecord], path: &Path, config: &Config) -> Result<()> {
    TableOutput::new(records)
        .with_separator_row(config.separator_row)
        .save(path)
        .with_context(|| format!("Failed to write table {}", path.display()))
}

fn run_scan(args: ScanArgs, mut config: Config, quiet: bool) -> Result<ExitCode> {
    if let Some(algorithm) = args.algorithm {
        config.algorithm = algorithm;
    }
    if args.threshold.is_some() {
        config.threshold = args.threshold;
    }
    if let Some(threads) = args.io_threads {
        config.io_threads = threads;
    }
    let threshold = config.effective_threshold();
    let out_path = table_path(args.output, &config);

    let scan_config = ScanConfig {
        walker: WalkerConfig {
            follow_symlinks: args.follow_symlinks || config.follow_symlinks,
            skip_hidden: args.skip_hidden || config.skip_hidden,
        },
        algorithm: config.algorithm,
        io_threads: config.io_threads,
    };
    log::info!(
        "Scanning {} with {} (threshold {})",
        args.root.display(),
        config.algorithm,
        threshold
    );

    let mut scanner =
        Scanner::new(scan_config).with_progress(Arc::new(Progress::new(quiet)));
    match signal::install_handler() {
        Ok(handler) => scanner = scanner.with_shutdown_flag(handler.get_flag()),
        Err(e) => log::warn!("{}; Ctrl+C will not stop the scan cleanly", e),
    }

    let outcome = scanner
        .scan(&args.root)
        .with_context(|| format!("Scan of {} failed", args.root.display()))?;

    for (record, issue) in outcome.issues() {
        log::warn!("{}: {}", record.full_path, issue);
    }
    for err in &outcome.walk_errors {
        log::warn!("{}", err);
    }
    let warnings = outcome.warnings();

    let (records, summary) = cluster(outcome.records, threshold)?;
    TableOutput::new(&records)
        .with_separator_row(config.separator_row && !args.no_separator)
        .save(&out_path)
        .with_context(|| format!("Failed to write table {}", out_path.display()))?;

    if !quiet {
        println!(
            "{} file(s), {} fingerprinted, {} group(s) covering {} file(s)",
            summary.total_records,
            summary.fingerprinted,
            summary.groups.bold(),
            summary.grouped_records
        );
        if warnings > 0 {
            println!("{} warning(s); run with -v for details", warnings.yellow());
        }
        println!("Table written to {}", out_path.display());
    }

    Ok(if summary.groups == 0 {
        ExitCode::NoDuplicates
    } else if warnings > 0 {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    })
}

fn paint_status(status: GroupStatus) -> String {
    match status {
        GroupStatus::OnlyOneFile => status.label().green().to_string(),
        GroupStatus::AllToBeDeleted => status.label().red().bold().to_string(),
        GroupStatus::MultipleDuplicates => status.label().yellow().to_string(),
    }
}

fn print_statuses(records: &[FileRecord]) -> Result<()> {
    let statuses = derive_statuses(records);
    let mut out = io::stdout().lock();

    for group in collect_groups(records) {
        let Some(&status) = statuses.get(&group.id) else {
            continue;
        };
        writeln!(
            out,
            "Group {:>4}  {:>3} file(s)  {:>3} kept  {}",
            group.id,
            group.len(),
            group.remaining(records),
            paint_status(status)
        )?;
    }

    let stats = GroupingStats::from_records(records);
    let attention = statuses.values().filter(|s| s.needs_attention()).count();
    writeln!(
        out,
        "{} group(s), {} file(s) marked, {} reclaimable",
        stats.groups,
        stats.marked_records,
        ByteSize::b(stats.reclaimable_bytes)
    )?;
    if attention > 0 {
        writeln!(out, "{} group(s) need attention", attention.yellow())?;
    }
    Ok(())
}

fn run_status(args: StatusArgs, config: &Config) -> Result<ExitCode> {
    let path = table_path(args.table.table, config);
    let records = load(&path)?;

    if args.json {
        JsonReport::new(&records)
            .write_to(&mut io::stdout().lock(), true)
            .context("Failed to write JSON report")?;
    } else {
        print_statuses(&records)?;
    }
    Ok(ExitCode::Success)
}

fn run_mark(args: MarkArgs, config: &Config, quiet: bool) -> Result<ExitCode> {
    let path = table_path(args.table.table, config);
    let mut records = load(&path)?;

    let changed = set_marked(&mut records, &args.file_path, args.delete)?;
    if changed {
        save(&records, &path, config)?;
    }

    if !quiet {
        let group = records
            .iter()
            .find(|r| r.full_path == args.file_path)
            .and_then(|r| r.group_id);
        let status = group.and_then(|id| derive_statuses(&records).get(&id).copied());
        match (group, status) {
            (Some(id), Some(status)) => {
                println!("{} (group {}: {})", args.file_path, id, paint_status(status))
            }
            _ => println!("{}", args.file_path),
        }
    }
    Ok(ExitCode::Success)
}

fn run_priority(args: PriorityArgs, config: &Config, quiet: bool) -> Result<ExitCode> {
    let path = table_path(args.table.table, config);
    let mut records = load(&path)?;

    let folders = if args.folders.is_empty() {
        config.priority_folders.clone()
    } else {
        args.folders
    };
    log::debug!("Priority folders: {:?}", folders);

    let outcome = apply_priority(&mut records, &folders);
    save(&records, &path, config)?;

    if !quiet {
        println!(
            "Resolved {} group(s), {} flag(s) changed",
            outcome.groups_resolved, outcome.records_changed
        );
        print_statuses(&records)?;
    }
    Ok(ExitCode::Success)
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn run_delete(args: DeleteArgs, config: &Config, quiet: bool) -> Result<ExitCode> {
    let path = table_path(args.table.table, config);
    let records = load(&path)?;

    let marked = records.iter().filter(|r| r.marked_for_deletion).count();
    if marked == 0 {
        if !quiet {
            println!("No files are marked for deletion");
        }
        return Ok(ExitCode::Success);
    }

    let permanent = args.permanent || config.permanent;
    if !args.yes && !args.dry_run {
        if io::stdin().is_terminal() {
            let how = if permanent {
                "permanently"
            } else {
                "to the trash"
            };
            if !confirm(&format!("Delete {} file(s) {}?", marked, how))? {
                println!("Aborted");
                return Ok(ExitCode::Success);
            }
        } else if permanent {
            anyhow::bail!("--permanent requires -y in non-interactive mode");
        }
    }

    let delete_config = DeleteConfig {
        permanent,
        dry_run: args.dry_run,
    };
    let report = delete_marked(&records, &delete_config);

    if !quiet {
        for id in &report.fully_marked_groups {
            println!("{} group {} had no file left to keep", "warning:".yellow(), id);
        }
        for (file, reason) in &report.errors {
            println!("{} {}: {}", "error:".red(), file, reason);
        }
        println!("{}", report.summary());
    }

    Ok(if report.all_succeeded() {
        ExitCode::Success
    } else {
        ExitCode::PartialSuccess
    })
}

fn run_config(explicit: Option<&Path>, config: &Config) -> Result<ExitCode> {
    let location = explicit
        .map(Path::to_path_buf)
        .or_else(Config::config_path);
    match location {
        Some(path) if path.is_file() => println!("# {}", path.display()),
        Some(path) => println!("# {} (not present, using defaults)", path.display()),
        None => println!("# no configuration directory available"),
    }
    print!("{}", config.to_toml()?);
    Ok(ExitCode::Success)
}
