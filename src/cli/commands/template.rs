//! `vct template` command - Print a CSV template for a record type

use console::style;
use miette::Result;

use crate::cli::args::parse_record_type;
use crate::entities::RecordType;
use crate::pipeline::exporter::escape_field;

#[derive(clap::Args, Debug)]
pub struct TemplateArgs {
    /// Record type (document, update-log, event, shop-item)
    #[arg(value_parser = parse_record_type)]
    pub record_type: RecordType,

    /// Print only the header line
    #[arg(long)]
    pub no_example: bool,
}

pub fn run(args: TemplateArgs) -> Result<()> {
    print!("{}", render_template(args.record_type, !args.no_example));

    // Usage hint goes to stderr so it doesn't interfere with redirected output
    eprintln!();
    eprintln!(
        "{} Template generated. Redirect to file: vct template {} > {}.csv",
        style("→").blue(),
        args.record_type,
        args.record_type.plural()
    );

    Ok(())
}

/// Header line of field names, optionally followed by an example row
pub fn render_template(record_type: RecordType, with_example: bool) -> String {
    let mut out = record_type.field_names().join(",");
    out.push('\n');
    if with_example {
        let example: Vec<String> = record_type
            .field_names()
            .into_iter()
            .map(|field| escape_field(example_value(record_type, field)))
            .collect();
        out.push_str(&example.join(","));
        out.push('\n');
    }
    out
}

fn example_value(record_type: RecordType, field: &str) -> &'static str {
    match (record_type, field) {
        (RecordType::Document, "title") => "Getting Started",
        (RecordType::Document, "content") => "Welcome to the guide, start here.",
        (RecordType::Document, "category") => "tutorial",
        (RecordType::Document, "author") => "Admin",

        (RecordType::UpdateLog, "version") => "v1.2.0",
        (RecordType::UpdateLog, "title") => "Summer Update",
        (RecordType::UpdateLog, "description") => "New swimsuits and events",
        (RecordType::UpdateLog, "content") => "Added the summer festival.",
        (RecordType::UpdateLog, "date") => "2024-07-01",

        (RecordType::Event, "name") => "Summer Festival",
        (RecordType::Event, "description") => "Limited-time beach event",
        (RecordType::Event, "eventType") => "festival",
        (RecordType::Event, "startDate") => "2024-07-01",
        (RecordType::Event, "endDate") => "2024-07-14",

        (RecordType::ShopItem, "name") => "Starter Pack",
        (RecordType::ShopItem, "description") => "Coins and a swimsuit ticket",
        (RecordType::ShopItem, "category") => "bundle",
        (RecordType::ShopItem, "currency") => "gems",
        (RecordType::ShopItem, "price") => "500",
        (RecordType::ShopItem, "rarity") => "SSR",

        (_, "tags") => "guide;beginner",
        (_, "isPublished") | (_, "isLimited") => "false",
        (_, "createdAt") | (_, "updatedAt") => "2024-06-01",
        _ => "",
    }
}
