use std::path::PathBuf;

use clap::builder::FalseyValueParser;
use clap::{ArgGroup, Args, Parser, Subcommand};
use ks_types::ObjectKind;

#[derive(Parser)]
#[command(
    name = "ks",
    about = "Keystone: content-addressed objects with validated tags",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Object store directory
    #[arg(long, global = true, env = "KS_STORE", default_value = ".ks")]
    pub store: PathBuf,

    /// Override an fsck check, e.g. `--fsck extraHeaderEntry=ignore`
    #[arg(long = "fsck", global = true, value_name = "ID=ACTION", value_parser = parse_fsck_override)]
    pub fsck: Vec<(String, String)>,

    /// Do not follow replacement records
    #[arg(
        long,
        global = true,
        env = "KS_NO_REPLACE_OBJECTS",
        value_parser = FalseyValueParser::new()
    )]
    pub no_replace_objects: bool,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate a tag read from stdin and write it to the store
    Mktag(MktagArgs),
    /// Compute an object address, optionally writing the object
    HashObject(HashObjectArgs),
    /// Show the type or content of a stored object
    CatFile(CatFileArgs),
    /// Serve one object in place of another
    Replace(ReplaceArgs),
}

#[derive(Args)]
pub struct MktagArgs {
    /// Validate and verify only; do not write
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct HashObjectArgs {
    /// Object type
    #[arg(short = 't', long = "type", default_value = "blob", value_parser = parse_kind)]
    pub kind: ObjectKind,
    /// Write the object into the store
    #[arg(short = 'w')]
    pub write: bool,
    /// File to read; `-` or nothing reads stdin
    pub file: Option<PathBuf>,
}

#[derive(Args)]
#[command(group(ArgGroup::new("mode").required(true).args(["show_type", "pretty"])))]
pub struct CatFileArgs {
    /// Print the object type
    #[arg(short = 't')]
    pub show_type: bool,
    /// Print the object content
    #[arg(short = 'p')]
    pub pretty: bool,
    pub object: String,
}

#[derive(Args)]
pub struct ReplaceArgs {
    pub original: String,
    pub replacement: String,
    /// Allow a replacement of a different type
    #[arg(short, long)]
    pub force: bool,
}

/// Parse `id=action` into its two halves.
pub fn parse_fsck_override(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((id, action)) if !id.is_empty() && !action.is_empty() => {
            Ok((id.to_string(), action.to_string()))
        }
        _ => Err(format!("expected <id>=<action>, got '{value}'")),
    }
}

fn parse_kind(value: &str) -> Result<ObjectKind, String> {
    value.parse().map_err(|e: ks_types::TypeError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn fsck_override_parsing() {
        assert_eq!(
            parse_fsck_override("extraHeaderEntry=ignore").unwrap(),
            ("extraHeaderEntry".to_string(), "ignore".to_string())
        );
        assert!(parse_fsck_override("extraHeaderEntry").is_err());
        assert!(parse_fsck_override("=ignore").is_err());
        assert!(parse_fsck_override("badDate=").is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ks",
            "mktag",
            "--store",
            "/tmp/s",
            "--fsck",
            "badDate=warn",
            "--fsck",
            "extraHeaderEntry=ignore",
            "--no-replace-objects",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Mktag(_)));
        assert_eq!(cli.store, PathBuf::from("/tmp/s"));
        assert_eq!(cli.fsck.len(), 2);
        assert_eq!(cli.fsck[1].0, "extraHeaderEntry");
        assert!(cli.no_replace_objects);
    }

    #[test]
    fn hash_object_type_flag() {
        let cli = Cli::try_parse_from(["ks", "hash-object", "-t", "commit", "-w", "-"]).unwrap();
        let Command::HashObject(args) = cli.command else {
            panic!("expected hash-object");
        };
        assert_eq!(args.kind, ObjectKind::Commit);
        assert!(args.write);
        assert!(Cli::try_parse_from(["ks", "hash-object", "-t", "widget"]).is_err());
    }

    #[test]
    fn cat_file_needs_exactly_one_mode() {
        assert!(Cli::try_parse_from(["ks", "cat-file", "abc"]).is_err());
        assert!(Cli::try_parse_from(["ks", "cat-file", "-t", "-p", "abc"]).is_err());
        assert!(Cli::try_parse_from(["ks", "cat-file", "-p", "abc"]).is_ok());
    }
}
