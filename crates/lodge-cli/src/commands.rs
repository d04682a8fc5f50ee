use colored::Colorize;
use tracing::debug;

use lodge_store::ObjectStore;
use lodge_types::{EntityKind, ObjectKey, Record};

use crate::cli::*;
use crate::tokens;

const CLASS_NOT_FOUND: &str = "** class doesn't exist **";
const INSTANCE_NOT_FOUND: &str = "** no instance found **";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut store = ObjectStore::from_env()?;
    debug!("object store ready");
    match cli.command {
        Command::Create(args) => cmd_create(&mut store, args),
        Command::Show(args) => cmd_show(&store, args),
        Command::All(args) => cmd_all(&store, args),
        Command::Update(args) => cmd_update(&mut store, args),
        Command::Destroy(args) => cmd_destroy(&mut store, args),
        Command::Count(args) => cmd_count(&store, args),
    }
}

/// Resolve a kind tag, reporting the console sentinel when it is outside
/// the registry. `None` means "already reported, stop quietly".
fn resolve_kind(tag: &str) -> Option<EntityKind> {
    match EntityKind::from_tag(tag) {
        Ok(kind) => Some(kind),
        Err(_) => {
            println!("{}", CLASS_NOT_FOUND.red());
            None
        }
    }
}

/// Build a record from create tokens, coercing each value toward its
/// schema column.
pub fn build_record(kind: EntityKind, fields: &[String]) -> Record {
    let mut record = Record::new(kind);
    for (name, value) in tokens::parse_assignments(fields) {
        let value = tokens::coerce_for_column(kind, &name, value);
        record.set(name, value);
    }
    record
}

pub fn cmd_create(store: &mut ObjectStore, args: CreateArgs) -> anyhow::Result<()> {
    let Some(kind) = resolve_kind(&args.kind) else {
        return Ok(());
    };
    let record = build_record(kind, &args.fields);
    println!("{}", record.id().yellow());
    store.new(record)?;
    store.save()?;
    Ok(())
}

pub fn cmd_show(store: &ObjectStore, args: ShowArgs) -> anyhow::Result<()> {
    let Some(kind) = resolve_kind(&args.kind) else {
        return Ok(());
    };
    match store.get(&ObjectKey::new(kind, args.id))? {
        Some(record) => println!("{record}"),
        None => println!("{}", INSTANCE_NOT_FOUND.red()),
    }
    Ok(())
}

pub fn cmd_all(store: &ObjectStore, args: AllArgs) -> anyhow::Result<()> {
    let kind = match &args.kind {
        Some(tag) => match resolve_kind(tag) {
            Some(kind) => Some(kind),
            None => return Ok(()),
        },
        None => None,
    };
    for record in store.all(kind)?.values() {
        println!("{record}");
    }
    Ok(())
}

pub fn cmd_update(store: &mut ObjectStore, args: UpdateArgs) -> anyhow::Result<()> {
    let Some(kind) = resolve_kind(&args.kind) else {
        return Ok(());
    };
    let Some(mut record) = store.get(&ObjectKey::new(kind, args.id))? else {
        println!("{}", INSTANCE_NOT_FOUND.red());
        return Ok(());
    };
    let value = tokens::coerce_update(kind, &args.field, &args.value);
    record.set(args.field, value);
    store.new(record)?;
    store.save()?;
    Ok(())
}

pub fn cmd_destroy(store: &mut ObjectStore, args: DestroyArgs) -> anyhow::Result<()> {
    let Some(kind) = resolve_kind(&args.kind) else {
        return Ok(());
    };
    match store.get(&ObjectKey::new(kind, args.id))? {
        Some(record) => {
            store.delete(Some(&record))?;
            store.save()?;
        }
        None => println!("{}", INSTANCE_NOT_FOUND.red()),
    }
    Ok(())
}

pub fn cmd_count(store: &ObjectStore, args: CountArgs) -> anyhow::Result<()> {
    let kind = match &args.kind {
        Some(tag) => match resolve_kind(tag) {
            Some(kind) => Some(kind),
            None => return Ok(()),
        },
        None => None,
    };
    println!("{}", store.count(kind)?);
    Ok(())
}
