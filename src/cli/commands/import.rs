//! `vct import` command - Preview, validate and import rows from CSV

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::cli::args::parse_record_type;
use crate::cli::helpers::{today, Session};
use crate::cli::table::{render_issues, render_mapping, render_rows, render_summary, PREVIEW_ISSUES, PREVIEW_ROWS};
use crate::cli::GlobalOpts;
use crate::core::{NotificationKind, Workspace};
use crate::entities::{RecordDefaults, RecordType};
use crate::pipeline::executor::{ImportError, ImportExecutor, RowFailure};
use crate::pipeline::input::read_source;
use crate::pipeline::issue::{error_count, has_blocking};
use crate::pipeline::mapping::{auto_assign, default_mapping, parse_override, MappingError, MappingSet};
use crate::pipeline::parser::{parse, RawTable};
use crate::pipeline::progress::{ImportProgress, ImportStage, ProgressTracker};
use crate::pipeline::validator::validate;

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Record type to import (document, update-log, event, shop-item)
    #[arg(value_parser = parse_record_type)]
    pub record_type: RecordType,

    /// CSV file to import, or - to read pasted text from stdin
    pub file: PathBuf,

    /// Map a field to a column, overriding auto-detection (repeatable)
    #[arg(long = "map", value_name = "FIELD=COLUMN")]
    pub map: Vec<String>,

    /// YAML file of field: column overrides, or the name of one saved in .vct/mappings/
    #[arg(long)]
    pub mapping: Option<PathBuf>,

    /// Category for documents whose row has none
    #[arg(long)]
    pub category: Option<String>,

    /// Show the preview and stop
    #[arg(long)]
    pub dry_run: bool,

    /// Import without asking for confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Write rows that failed to import to this CSV for correction
    #[arg(long, value_name = "PATH")]
    pub reject_file: Option<PathBuf>,
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let record_type = args.record_type;
    let quiet = session.quiet();

    let mut last_stage = None;
    let mut progress = ProgressTracker::new().with_observer(move |p: &ImportProgress| {
        if quiet || p.stage == ImportStage::Complete || last_stage == Some(p.stage) {
            return;
        }
        last_stage = Some(p.stage);
        eprintln!("{} {}", style("→").blue(), style(&p.message).dim());
    });

    progress.advance(
        ImportStage::Uploading,
        format!("Reading {}", args.file.display()),
    );
    let text = match read_source(&args.file, session.config.max_upload_bytes()) {
        Ok(text) => text,
        Err(e) => {
            session.notify(NotificationKind::Error, "Import Failed", &e.to_string());
            return Err(ImportError::from(e).into());
        }
    };

    progress.advance(ImportStage::Parsing, "Parsing rows");
    let table = match parse(&text) {
        Ok(table) => table,
        Err(e) => {
            session.notify(NotificationKind::Error, "Import Failed", &e.to_string());
            return Err(ImportError::from(e).into());
        }
    };

    let mapping_file = args
        .mapping
        .as_deref()
        .map(|path| resolve_mapping_file(&session.workspace, path));
    let mut mapping = build_mapping(record_type, &table, mapping_file.as_deref(), &args.map)?;
    if record_type == RecordType::Document && args.category.is_some() {
        mapping.satisfy_with_default("category")?;
    }
    let issues = validate(&table, &mapping);

    println!(
        "{} Preview of {} rows for {}",
        style("→").blue(),
        style(table.row_count()).cyan(),
        style(record_type.plural()).cyan()
    );
    println!();
    println!("{}", render_summary(&table, &issues));
    println!();
    println!("{}", style("Mapping").bold());
    println!("{}", render_mapping(&mapping));
    println!();
    println!("{}", style("Rows").bold());
    println!("{}", render_rows(&table, PREVIEW_ROWS));
    if table.row_count() > PREVIEW_ROWS {
        println!(
            "{}",
            style(format!("... and {} more rows", table.row_count() - PREVIEW_ROWS)).dim()
        );
    }
    if !issues.is_empty() {
        println!();
        println!("{}", style("Issues").bold());
        println!("{}", render_issues(&issues, PREVIEW_ISSUES));
        if issues.len() > PREVIEW_ISSUES {
            println!(
                "{}",
                style(format!("... and {} more issues", issues.len() - PREVIEW_ISSUES)).dim()
            );
        }
    }
    println!();

    if has_blocking(&issues) {
        let errors = error_count(&issues);
        session.notify(
            NotificationKind::Error,
            "Validation Failed",
            &format!(
                "Found {} critical errors. Please fix them before importing.",
                errors
            ),
        );
        return Err(ImportError::ValidationFailed { issues }.into());
    }

    if args.dry_run {
        println!(
            "{}",
            style("Dry run complete. Nothing was imported.").yellow()
        );
        return Ok(());
    }

    if !args.yes && !confirm(record_type, table.row_count())? {
        session.notify(NotificationKind::Info, "Import Cancelled", "No rows were imported");
        return Ok(());
    }

    let defaults = RecordDefaults {
        author: session.config.author(),
        category: args.category.clone(),
        today: today(),
    };
    let mut store = session.open_store()?;
    let summary = ImportExecutor::new(&mut store, record_type, defaults)
        .run(&table, &mapping, &mut progress)?;

    for failure in &summary.failures {
        println!(
            "{} Row {} ({}): {}",
            style("✗").red(),
            failure.row,
            style(&failure.label).yellow(),
            failure.error
        );
    }

    if let Some(path) = &args.reject_file {
        if !summary.failures.is_empty() {
            write_rejects(path, &table, &summary.failures)?;
            println!(
                "{} Wrote {} failed rows to {}",
                style("→").blue(),
                summary.failures.len(),
                style(path.display()).cyan()
            );
        }
    }

    let kind = if summary.is_clean() {
        NotificationKind::Success
    } else {
        NotificationKind::Warning
    };
    session.notify(kind, "Import Complete", &summary.message());

    Ok(())
}

/// Auto-assign columns, then apply the mapping file and --map overrides in that order
fn build_mapping(
    record_type: RecordType,
    table: &RawTable,
    mapping_file: Option<&Path>,
    overrides: &[String],
) -> Result<MappingSet> {
    let mut mapping = auto_assign(default_mapping(record_type), table.headers());

    if let Some(path) = mapping_file {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| MappingError::File(format!("{}: {}", path.display(), e)))?;
        mapping.apply_overrides_yaml(&yaml)?;
    }

    let parsed = overrides
        .iter()
        .map(|s| parse_override(s))
        .collect::<Result<BTreeMap<_, _>, _>>()?;
    mapping.apply_overrides(&parsed)?;

    Ok(mapping)
}

/// A path that exists as given, else `<name>.yaml` under the workspace's mappings directory
fn resolve_mapping_file(workspace: &Workspace, path: &Path) -> PathBuf {
    if path.exists() {
        return path.to_path_buf();
    }
    let saved = workspace.mappings_dir().join(path).with_extension("yaml");
    if saved.exists() {
        saved
    } else {
        path.to_path_buf()
    }
}

fn confirm(record_type: RecordType, rows: usize) -> Result<bool> {
    if !console::Term::stderr().is_term() {
        return Err(miette::miette!(
            help = "pass --yes to import without a prompt",
            "cannot ask for confirmation without a terminal"
        ));
    }
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Import {} rows as {}?", rows, record_type.plural()))
        .default(true)
        .interact()
        .into_diagnostic()
}

/// Failed rows with their original cells plus an `import_error` column
fn write_rejects(path: &Path, table: &RawTable, failures: &[RowFailure]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).into_diagnostic()?;

    let mut header: Vec<&str> = table.headers().iter().map(String::as_str).collect();
    header.push("import_error");
    writer.write_record(&header).into_diagnostic()?;

    for failure in failures {
        let Some(row) = table.rows().get(failure.row - 1) else {
            continue;
        };
        let mut record: Vec<String> = (0..table.headers().len())
            .map(|col| row.get(col).cloned().unwrap_or_default())
            .collect();
        record.push(failure.error.to_string());
        writer.write_record(&record).into_diagnostic()?;
    }

    writer.flush().into_diagnostic()
}
