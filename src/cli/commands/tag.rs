//! `vct tag` command - Add or remove tags on a stored record

use console::style;
use miette::Result;

use crate::cli::args::parse_record_type;
use crate::cli::helpers::Session;
use crate::cli::GlobalOpts;
use crate::core::{Lister, NotificationKind, PersistError, Persister, RecordId};
use crate::entities::{Record, RecordType, TagList};

#[derive(clap::Args, Debug)]
pub struct TagArgs {
    /// Record type (document, update-log, event, shop-item)
    #[arg(value_parser = parse_record_type)]
    pub record_type: RecordType,

    /// Record id
    pub id: String,

    /// Tag to add (repeatable)
    #[arg(long = "add", short = 'a')]
    pub add: Vec<String>,

    /// Tag to remove (repeatable)
    #[arg(long = "remove", short = 'r')]
    pub remove: Vec<String>,
}

pub fn run(args: TagArgs, global: &GlobalOpts) -> Result<()> {
    check_id_type(args.record_type, &args.id)?;
    let mut session = Session::open(global)?;
    let mut store = session.open_store()?;

    let tags = edit_tags(&mut store, args.record_type, &args.id, &args.add, &args.remove)?;

    if tags.is_empty() {
        println!("{} {} has no tags", style("→").blue(), style(&args.id).cyan());
    } else {
        println!(
            "{} {}: {}",
            style("→").blue(),
            style(&args.id).cyan(),
            tags.as_slice().join(", ")
        );
    }
    session.notify(
        NotificationKind::Success,
        "Tags Updated",
        &format!("{} now has {} tags", args.id, tags.len()),
    );
    Ok(())
}

/// Parse the id and check its prefix names the requested record type
fn check_id_type(record_type: RecordType, id: &str) -> Result<()> {
    let parsed = RecordId::parse(id).map_err(|e| {
        miette::miette!(help = "record ids are listed by: vct list <type> --json", "{}", e)
    })?;
    if parsed.record_type() != record_type {
        return Err(miette::miette!(
            help = format!("try: vct tag {} {}", parsed.record_type(), id),
            "{} belongs to {}, not {}",
            id,
            parsed.record_type().plural(),
            record_type.plural()
        ));
    }
    Ok(())
}

/// Apply removals then additions and store the result with a partial update
pub fn edit_tags<S: Persister + Lister>(
    store: &mut S,
    record_type: RecordType,
    id: &str,
    add: &[String],
    remove: &[String],
) -> Result<TagList, PersistError> {
    let record = store.get(record_type, id)?;
    let mut tags = TagList::from_value(record.get("tags"));

    for tag in remove {
        tags.remove(tag);
    }
    for tag in add {
        tags.add(tag);
    }

    let mut partial = Record::new();
    partial.insert("tags".into(), tags.to_value());
    store.update(record_type, id, partial)?;
    Ok(tags)
}
