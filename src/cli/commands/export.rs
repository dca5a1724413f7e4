//! `vct export` command - Filter stored records and write an export file

use chrono::NaiveDate;
use miette::{IntoDiagnostic, Result};
use std::io::Write;
use std::path::PathBuf;

use crate::cli::args::parse_record_type;
use crate::cli::helpers::{today, write_file, Session};
use crate::cli::GlobalOpts;
use crate::core::{fetch_all, NotificationKind};
use crate::entities::RecordType;
use crate::pipeline::coercer::parse_date;
use crate::pipeline::exporter::{
    export, DateRange, ExportError, ExportFilters, ExportFormat, ExportRequest, PublishState,
};

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Record type to export (document, update-log, event, shop-item)
    #[arg(value_parser = parse_record_type)]
    pub record_type: RecordType,

    /// Output format (default from config, else csv)
    #[arg(long, short = 'F', value_enum)]
    pub format: Option<ExportFormat>,

    /// Columns to include, in order (default: every key of the first record)
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Keep records containing this text anywhere (case-insensitive)
    #[arg(long)]
    pub search: Option<String>,

    /// Keep records in this category (repeatable)
    #[arg(long)]
    pub category: Vec<String>,

    /// Keep records with this publication state (repeatable)
    #[arg(long, value_enum)]
    pub status: Vec<PublishState>,

    /// Earliest creation date to include (inclusive)
    #[arg(long, value_parser = parse_date_arg)]
    pub from: Option<NaiveDate>,

    /// Latest creation date to include (inclusive)
    #[arg(long, value_parser = parse_date_arg)]
    pub to: Option<NaiveDate>,

    /// Output file (default: <record-type>-<date>.<ext>)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Omit the header line from CSV output
    #[arg(long)]
    pub no_headers: bool,

    /// Write to stdout instead of a file
    #[arg(long, conflicts_with = "output")]
    pub stdout: bool,
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).ok_or_else(|| format!("invalid date '{}' (expected YYYY-MM-DD)", s))
}

pub fn run(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let store = session.open_store()?;
    let records = fetch_all(&store, args.record_type)?;

    let request = ExportRequest {
        format: args.format.unwrap_or_else(|| session.config.export_format()),
        columns: args
            .columns
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect(),
        filters: ExportFilters {
            search: args.search.clone(),
            categories: args.category.clone(),
            states: args.status.clone(),
            dates: DateRange {
                start: args.from,
                end: args.to,
            },
        },
        include_headers: !args.no_headers,
        filename: args.output.as_ref().map(|p| p.display().to_string()),
    };

    let output = match export(&records, args.record_type, &request, today()) {
        Ok(output) => output,
        Err(ExportError::NoData) => {
            session.notify(
                NotificationKind::Warning,
                "No Data to Export",
                &ExportError::NoData.to_string(),
            );
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if args.stdout {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&output.bytes).into_diagnostic()?;
        stdout.write_all(b"\n").into_diagnostic()?;
        return Ok(());
    }

    write_file(&PathBuf::from(&output.filename), &output.bytes)?;
    session.notify(
        NotificationKind::Success,
        "Export Successful",
        &format!(
            "Exported {} records to {}",
            output.record_count, output.filename
        ),
    );
    Ok(())
}
