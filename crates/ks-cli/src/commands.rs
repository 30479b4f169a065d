use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use ks_mktag::{CommitReport, ErrorCategory, MktagConfig, MktagError, TagCommitter};
use ks_store::{FsObjectStore, ObjectStore, ReplacementMap, StoreError, StoredObject};
use ks_types::ObjectId;
use serde_json::json;
use tracing::debug;

use crate::cli::*;

pub const EXIT_INVALID_INPUT: u8 = 1;
pub const EXIT_IO: u8 = 2;
pub const EXIT_STORE_INTEGRITY: u8 = 3;
pub const EXIT_USAGE: u8 = 129;

const CONFIG_FILE: &str = "config.toml";

/// Options shared by every subcommand.
struct Session {
    store: FsObjectStore,
    fsck: Vec<(String, String)>,
    no_replace_objects: bool,
    format: OutputFormat,
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let session = Session {
        store: FsObjectStore::open(cli.store),
        fsck: cli.fsck,
        no_replace_objects: cli.no_replace_objects,
        format: cli.format,
    };
    debug!(store = %session.store.root().display(), "opened store");

    match cli.command {
        Command::Mktag(args) => cmd_mktag(&session, args, io::stdin().lock(), io::stdout().lock()),
        Command::HashObject(args) => cmd_hash_object(&session, args),
        Command::CatFile(args) => cmd_cat_file(&session, args),
        Command::Replace(args) => cmd_replace(&session, args),
    }
}

/// Read a tag from `input`, commit it, and print its address to `out`.
/// Nothing is written to `out` unless the commit succeeds.
fn cmd_mktag(
    session: &Session,
    args: MktagArgs,
    mut input: impl Read,
    mut out: impl Write,
) -> anyhow::Result<()> {
    let config = MktagConfig::load(&session.store.root().join(CONFIG_FILE))?;
    let policy = config.severity_policy(&session.fsck)?;
    let resolver = if session.no_replace_objects || !config.core.use_replace_refs {
        debug!("replacement lookup disabled");
        ReplacementMap::new()
    } else {
        session.store.load_replacements()?
    };
    let committer = TagCommitter::new(&session.store, resolver, policy);

    if args.dry_run {
        let mut payload = Vec::new();
        input
            .read_to_end(&mut payload)
            .map_err(MktagError::Input)?;
        let verified = committer.check(&payload)?;
        return match session.format {
            OutputFormat::Text => {
                eprintln!(
                    "{} tag refers to {} {}",
                    "ok:".green().bold(),
                    verified.kind,
                    verified.requested
                );
                Ok(())
            }
            OutputFormat::Json => write_json(
                out,
                &json!({
                    "valid": true,
                    "object": verified.requested.to_hex(),
                    "resolved": verified.resolved.to_hex(),
                    "type": verified.kind,
                }),
            ),
        };
    }

    let report = committer.run_from_reader(input);
    let phases = phase_trail(&report);
    let id = report.outcome?;
    match session.format {
        OutputFormat::Text => writeln!(out, "{id}")?,
        OutputFormat::Json => {
            write_json(&mut out, &json!({ "object": id.to_hex(), "phases": phases }))?
        }
    }
    out.flush()?;
    Ok(())
}

fn cmd_hash_object(session: &Session, args: HashObjectArgs) -> anyhow::Result<()> {
    let data = match args.file.as_deref() {
        None => read_stdin()?,
        Some(path) if path == Path::new("-") => read_stdin()?,
        Some(path) => {
            fs::read(path).with_context(|| format!("could not read '{}'", path.display()))?
        }
    };
    let object = StoredObject::new(args.kind, data);
    let id = if args.write {
        session.store.write(&object)?
    } else {
        object.compute_id()
    };

    match session.format {
        OutputFormat::Text => println!("{id}"),
        OutputFormat::Json => print_json(&json!({
            "object": id.to_hex(),
            "type": object.kind,
            "size": object.size,
            "written": args.write,
        }))?,
    }
    Ok(())
}

fn cmd_cat_file(session: &Session, args: CatFileArgs) -> anyhow::Result<()> {
    let id = parse_object_id(&args.object)?;
    let Some(object) = session.store.read(&id)? else {
        bail!("not a valid object name '{}'", args.object);
    };

    match session.format {
        OutputFormat::Json => print_json(&json!({
            "object": id.to_hex(),
            "type": object.kind,
            "size": object.size,
            "content": args.pretty.then(|| String::from_utf8_lossy(&object.data).into_owned()),
        })),
        OutputFormat::Text if args.show_type => {
            println!("{}", object.kind);
            Ok(())
        }
        OutputFormat::Text => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&object.data)?;
            stdout.flush()?;
            Ok(())
        }
    }
}

fn cmd_replace(session: &Session, args: ReplaceArgs) -> anyhow::Result<()> {
    let original = parse_object_id(&args.original)?;
    let replacement = parse_object_id(&args.replacement)?;
    if original == replacement {
        bail!("new object is the same as the old one: '{original}'");
    }

    let Some(old) = session.store.read(&original)? else {
        bail!("failed to resolve '{}' as a valid object", args.original);
    };
    let Some(new) = session.store.read(&replacement)? else {
        bail!("failed to resolve '{}' as a valid object", args.replacement);
    };
    if old.kind != new.kind && !args.force {
        bail!(
            "objects must be of the same type: '{original}' points to a {} but '{replacement}' points to a {}",
            old.kind,
            new.kind
        );
    }

    session.store.add_replacement(&original, &replacement)?;
    match session.format {
        OutputFormat::Text => println!(
            "{} {} now reads as {}",
            "✓".green().bold(),
            original.short_hex().yellow(),
            replacement.short_hex().yellow()
        ),
        OutputFormat::Json => print_json(&json!({
            "original": original.to_hex(),
            "replacement": replacement.to_hex(),
        }))?,
    }
    Ok(())
}

fn read_stdin() -> anyhow::Result<Vec<u8>> {
    let mut data = Vec::new();
    io::stdin()
        .lock()
        .read_to_end(&mut data)
        .context("could not read stdin")?;
    Ok(data)
}

fn parse_object_id(value: &str) -> anyhow::Result<ObjectId> {
    value
        .parse()
        .with_context(|| format!("not a valid object name '{value}'"))
}

fn phase_trail(report: &CommitReport) -> serde_json::Value {
    report
        .phases
        .iter()
        .map(|record| {
            json!({
                "phase": record.phase.to_string(),
                "elapsed_us": record.elapsed.as_micros() as u64,
            })
        })
        .collect()
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    write_json(io::stdout().lock(), value)
}

fn write_json(mut out: impl Write, value: &serde_json::Value) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Exit status
// ---------------------------------------------------------------------------

pub fn category_exit_code(category: ErrorCategory) -> u8 {
    match category {
        ErrorCategory::InvalidInput => EXIT_INVALID_INPUT,
        ErrorCategory::Io => EXIT_IO,
        ErrorCategory::StoreIntegrity => EXIT_STORE_INTEGRITY,
    }
}

/// Map a failed command to its exit status.
///
/// The first recognised error in the chain decides; anything else is
/// treated as invalid input.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<MktagError>() {
            return category_exit_code(e.category());
        }
        if let Some(e) = cause.downcast_ref::<StoreError>() {
            return if e.is_corruption() {
                EXIT_STORE_INTEGRITY
            } else {
                EXIT_IO
            };
        }
        if cause.is::<io::Error>() {
            return EXIT_IO;
        }
    }
    EXIT_INVALID_INPUT
}

/// Render an error and its causes on one line, skipping causes whose text
/// the outer message already includes.
pub fn render_error(err: &anyhow::Error) -> String {
    let mut out = err.to_string();
    for cause in err.chain().skip(1) {
        let text = cause.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
    }
    out
}
