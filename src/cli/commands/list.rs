//! `vct list` command - Page through stored records

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::args::parse_record_type;
use crate::cli::helpers::Session;
use crate::cli::table::render_records;
use crate::cli::GlobalOpts;
use crate::core::{ListOptions, Lister};
use crate::entities::RecordType;

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Record type (document, update-log, event, shop-item)
    #[arg(value_parser = parse_record_type)]
    pub record_type: RecordType,

    /// Maximum records to show
    #[arg(long, short = 'n', default_value_t = 50)]
    pub limit: usize,

    /// Records to skip
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Print records as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let store = session.open_store()?;

    let page = store.list(&ListOptions {
        record_type: args.record_type,
        limit: args.limit,
        offset: args.offset,
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&page.items).into_diagnostic()?);
        return Ok(());
    }

    if page.items.is_empty() {
        println!("No {} found.", args.record_type.plural());
        return Ok(());
    }

    let mut columns = vec!["id", args.record_type.natural_key()];
    columns.extend(
        args.record_type
            .field_names()
            .into_iter()
            .filter(|f| *f != args.record_type.natural_key())
            .take(3),
    );
    println!("{}", render_records(&page.items, &columns));

    if !global.quiet {
        println!();
        println!(
            "{}",
            style(format!(
                "Showing {}-{} of {} {}",
                args.offset + 1,
                args.offset + page.items.len(),
                page.total,
                args.record_type.plural()
            ))
            .dim()
        );
    }
    Ok(())
}
