//! `vct mapping` command - Show the field mapping for a record type

use console::style;
use miette::{IntoDiagnostic, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::cli::args::parse_record_type;
use crate::cli::helpers::discover_workspace;
use crate::cli::table::render_mapping;
use crate::cli::GlobalOpts;
use crate::core::Config;
use crate::entities::RecordType;
use crate::pipeline::input::read_source;
use crate::pipeline::mapping::{auto_assign, default_mapping, MappingSet};
use crate::pipeline::parser::parse;

#[derive(clap::Args, Debug)]
pub struct MappingArgs {
    /// Record type (document, update-log, event, shop-item)
    #[arg(value_parser = parse_record_type)]
    pub record_type: RecordType,

    /// CSV file whose headers should be auto-assigned
    pub file: Option<PathBuf>,

    /// Print assignments as YAML, usable with `vct import --mapping`
    #[arg(long)]
    pub yaml: bool,
}

pub fn run(args: MappingArgs, global: &GlobalOpts) -> Result<()> {
    let mut mapping = default_mapping(args.record_type);

    if let Some(file) = &args.file {
        let workspace = discover_workspace(global).ok();
        let limit = Config::load(workspace.as_ref()).max_upload_bytes();
        let text = read_source(file, limit)?;
        let table = parse(&text)?;
        mapping = auto_assign(mapping, table.headers());
    }

    if args.yaml {
        print!("{}", mapping_yaml(&mapping)?);
        return Ok(());
    }

    println!("{}", render_mapping(&mapping));
    if args.file.is_some() {
        println!();
        println!(
            "{} {} of {} fields mapped",
            style("→").blue(),
            style(mapping.mapped_count()).cyan(),
            mapping.entries().len()
        );
    }
    Ok(())
}

/// `field: column` pairs for every mapped field
fn mapping_yaml(mapping: &MappingSet) -> Result<String> {
    let pairs: BTreeMap<&str, &str> = mapping
        .entries()
        .iter()
        .filter_map(|e| Some((e.field.as_str(), e.column.as_deref()?)))
        .collect();
    serde_yml::to_string(&pairs).into_diagnostic()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_round_trips_into_overrides() {
        let headers = vec!["Item Name".to_string(), "Cost".to_string()];
        let mut mapping = auto_assign(default_mapping(RecordType::ShopItem), &headers);
        mapping.assign("price", Some("Cost".into())).unwrap();

        let yaml = mapping_yaml(&mapping).unwrap();
        let mut reloaded = default_mapping(RecordType::ShopItem);
        reloaded.apply_overrides_yaml(&yaml).unwrap();
        assert_eq!(reloaded, mapping);
    }
}
