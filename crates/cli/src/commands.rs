//! Command implementations. JSON goes to stdout; status lines go to stderr.

use std::path::Path;

use serde::Serialize;
use sortkeep_organize::analysis::analyze;
use sortkeep_organize::engine::{load_datasets, validate_all, RunOptions};
use sortkeep_organize::{map_structure, plan_all, run, ArchiveMode, OrganizerConfig};

use crate::exit_codes::EXIT_VALIDATION_FAILED;
use crate::CliError;

fn to_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

pub fn cmd_validate(config: &OrganizerConfig, json: bool) -> Result<(), CliError> {
    let loaded = load_datasets(config);
    let results = validate_all(config, &loaded);

    if json {
        println!("{}", to_json(&results)?);
    } else {
        for v in &results {
            let status = if v.report.is_valid { "valid" } else { "INVALID" };
            println!("{}: {} ({})", v.dataset, status, plural(v.report.warnings.len(), "warning", "warnings"));
            for e in &v.report.errors {
                println!("  error:   {e}");
            }
            for w in &v.report.warnings {
                println!("  warning: {w}");
            }
        }
    }

    let invalid: Vec<&str> = results
        .iter()
        .filter(|v| !v.report.is_valid)
        .map(|v| v.dataset.as_str())
        .collect();
    let warnings: usize = results.iter().map(|v| v.report.warnings.len()).sum();
    eprintln!(
        "validated {}: {} invalid, {}",
        plural(results.len(), "dataset", "datasets"),
        invalid.len(),
        plural(warnings, "warning", "warnings"),
    );

    if !invalid.is_empty() {
        return Err(CliError::new(
            EXIT_VALIDATION_FAILED,
            format!("invalid dataset(s): {}", invalid.join(", ")),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// analyze
// ---------------------------------------------------------------------------

pub fn cmd_analyze(config: &OrganizerConfig, json: bool) -> Result<(), CliError> {
    let loaded = load_datasets(config);
    let analysis = analyze(config, &loaded);

    if json {
        println!("{}", to_json(&analysis)?);
    } else {
        let width = analysis.datasets.iter().map(|d| d.dataset.len()).max().unwrap_or(0);
        for d in &analysis.datasets {
            println!(
                "{:<width$}  {:>6} records  {:>6} unique  {:>6} duplicates  [{} / {}]",
                d.dataset, d.total_records, d.unique_records, d.duplicate_count, d.para_category, d.hub,
            );
        }
        for r in &analysis.recommendations {
            println!("[{}] {}", r.priority, r.message);
        }
    }

    eprintln!(
        "{} across {}: {}",
        plural(analysis.total_records, "record", "records"),
        plural(analysis.datasets.len(), "dataset", "datasets"),
        plural(analysis.total_duplicates, "duplicate", "duplicates"),
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// archive
// ---------------------------------------------------------------------------

pub fn cmd_archive(config: &OrganizerConfig, live: bool, json: bool) -> Result<(), CliError> {
    let mode = ArchiveMode::from_dry_run(!live);
    let options = RunOptions::now(mode);
    let loaded = load_datasets(config);
    let store = config.archive_store();

    let archive_run = plan_all(config, &loaded, mode, options.timestamp, &store)?;

    if json {
        println!("{}", to_json(&archive_run)?);
    } else {
        for r in &archive_run.processed {
            match &r.archive_file {
                Some(path) => println!(
                    "{}: archived {} of {} -> {}",
                    r.dataset,
                    r.archived_count,
                    plural(r.original_count, "record", "records"),
                    path.display()
                ),
                None => println!(
                    "{}: {} of {} to archive, {} kept",
                    r.dataset,
                    r.archived_count,
                    plural(r.original_count, "record", "records"),
                    r.kept_count
                ),
            }
        }
    }

    if mode.is_dry_run() {
        eprintln!(
            "dry run: {} would be archived to {} (re-run with --live to write)",
            plural(archive_run.total_archived, "record", "records"),
            store.dir().display()
        );
    } else {
        eprintln!(
            "live: {} archived to {}",
            plural(archive_run.total_archived, "record", "records"),
            store.dir().display()
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// structure
// ---------------------------------------------------------------------------

pub fn cmd_structure(config: &OrganizerConfig, json: bool) -> Result<(), CliError> {
    let structure = map_structure(&config.datasets, &config.categories, &config.hubs);

    if json {
        println!("{}", to_json(&structure)?);
        return Ok(());
    }

    println!("Categories");
    for group in &structure.para.categories {
        println!("  {} ({}) - {}", group.name, group.prefix, group.description);
        for ds in &group.datasets {
            println!("    {} -> {}  [{}]", ds.name, ds.suggested_name, ds.hub);
        }
    }
    println!("Hubs");
    for hub in &structure.hub_spoke.hubs {
        println!("  {} - {}", hub.name, hub.description);
        println!("    spokes:    {}", hub.spokes.join(", "));
        println!("    connected: {}", hub.connected_datasets.join(", "));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// report
// ---------------------------------------------------------------------------

pub fn cmd_report(config: &OrganizerConfig, live: bool, output: Option<&Path>) -> Result<(), CliError> {
    let options = RunOptions::now(ArchiveMode::from_dry_run(!live));
    let loaded = load_datasets(config);
    let report = run(config, &loaded, options)?;
    let json = to_json(&report)?;

    match output {
        Some(path) => {
            std::fs::write(path, &json).map_err(|e| {
                CliError::usage(format!("cannot write {}: {e}", path.display()))
            })?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }

    let s = &report.summary;
    eprintln!(
        "{} mode: {} in {}, {} ({} archived), {} failed to load",
        report.mode,
        plural(s.total_records, "record", "records"),
        plural(s.total_datasets, "dataset", "datasets"),
        plural(s.duplicates_found, "duplicate", "duplicates"),
        report.archive_results.total_archived,
        report.load_errors.len(),
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// archives
// ---------------------------------------------------------------------------

pub fn cmd_archives(config: &OrganizerConfig, json: bool) -> Result<(), CliError> {
    let store = config.archive_store();
    let files = store
        .list()
        .map_err(|e| CliError::general(e.to_string()))?;

    if json {
        println!("{}", to_json(&files)?);
    } else {
        for f in &files {
            let name = f
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let entries = f
                .entries
                .map(|n| plural(n, "entry", "entries"))
                .unwrap_or_else(|| "unreadable".to_string());
            println!("{name}  {}  {entries}", f.dataset);
        }
    }

    eprintln!("{} in {}", plural(files.len(), "archive file", "archive files"), store.dir().display());
    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

pub fn cmd_config_show(config: &OrganizerConfig) -> Result<(), CliError> {
    print!("{}", config.to_toml()?);
    Ok(())
}

pub fn cmd_config_check(config: &OrganizerConfig, file: Option<&Path>) -> Result<(), CliError> {
    let source = file
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "effective config".to_string());
    eprintln!(
        "valid: {source} '{}' with {}, {}, {}",
        config.name,
        plural(config.datasets.len(), "dataset", "datasets"),
        plural(config.categories.len(), "category", "categories"),
        plural(config.hubs.len(), "hub", "hubs"),
    );
    Ok(())
}
