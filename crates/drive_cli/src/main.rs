use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use drive_fs::{describe, Drive, DriveConfig, Entry, EntryId};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

mod local;
mod logging;

#[derive(Parser, Debug)]
#[command(name = "drive")]
#[command(about = "Load a local directory into an in-memory drive and inspect or pack it", long_about = None)]
struct Args {
    /// JSON config file (root label, archive prefix, compression, upload limit)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print machine readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the folder tree with sizes and types
    Tree {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },

    /// Find entries whose name contains QUERY
    Search {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
        query: String,
    },

    /// Export the drive, or the named top-level entries, as a ZIP archive
    Pack {
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Name of a top-level entry to include (repeatable)
        #[arg(long = "select", value_name = "NAME")]
        select: Vec<String>,

        /// Output file (default: suggested archive name in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let config = DriveConfig::load_or_default(args.config.as_deref())
        .with_context(|| format!("Failed to load config {:?}", args.config))?;

    match &args.command {
        Command::Tree { dir } => {
            let drive = load_drive(config, dir)?;
            if args.json {
                let tree = tree_json(&drive, None);
                println!("{}", serde_json::to_string_pretty(&tree)?);
            } else {
                println!("{}", drive.config().root_label);
                print_tree(&drive, None, 1);
            }
        }
        Command::Search { dir, query } => {
            let drive = load_drive(config, dir)?;
            let hits: Vec<SearchHit> = drive
                .search(query)
                .into_iter()
                .map(|entry| SearchHit {
                    location: drive.location_of(entry.id).unwrap_or_default(),
                    entry,
                })
                .collect();

            if args.json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else if hits.is_empty() {
                println!("No matches for '{}'", query);
            } else {
                for hit in &hits {
                    let display = describe(hit.entry);
                    println!("{:<40} {:<12} {}", display.name, display.type_name, hit.location);
                }
            }
        }
        Command::Pack { dir, select, output } => {
            let drive = load_drive(config, dir)?;
            let ids = select_roots(&drive, select)?;
            let archive = drive.export_archive(&ids).context("Failed to build archive")?;

            let path = output.clone().unwrap_or_else(|| PathBuf::from(&archive.file_name));
            fs::write(&path, &archive.bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "📦 {} ({} files, {} folders, {} bytes)",
                path.display(),
                archive.file_count,
                archive.folder_count,
                archive.bytes.len()
            );
        }
    }

    Ok(())
}

fn load_drive(config: DriveConfig, dir: &Path) -> Result<Drive> {
    let mut drive = Drive::new(config);
    let items = local::collect_upload(dir)?;
    let report = drive
        .ingest_upload(None, items)
        .with_context(|| format!("Failed to load {}", dir.display()))?;
    if report.skipped > 0 {
        tracing::warn!("[DRIVE] {} file(s) could not be loaded", report.skipped);
    }
    Ok(drive)
}

/// Root entries named in `names`, or every root entry when `names` is empty.
fn select_roots(drive: &Drive, names: &[String]) -> Result<Vec<EntryId>> {
    let roots = drive.entries_in(None);
    if names.is_empty() {
        return Ok(roots.iter().map(|e| e.id).collect());
    }

    let mut ids = Vec::new();
    for name in names {
        let matches: Vec<EntryId> = roots.iter().filter(|e| &e.name == name).map(|e| e.id).collect();
        if matches.is_empty() {
            bail!("No top-level entry named '{}'", name);
        }
        ids.extend(matches);
    }
    Ok(ids)
}

fn print_tree(drive: &Drive, folder: Option<EntryId>, depth: usize) {
    let options = drive.list_options();
    for entry in drive.list(folder, &options) {
        let display = describe(entry);
        let indent = "  ".repeat(depth);
        if entry.is_folder() {
            println!("{}{}/", indent, display.name);
            print_tree(drive, Some(entry.id), depth + 1);
        } else {
            println!("{}{} ({}, {})", indent, display.name, display.size, display.type_name);
        }
    }
}

#[derive(Serialize)]
struct TreeNode<'a> {
    #[serde(flatten)]
    entry: &'a Entry,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<TreeNode<'a>>,
}

fn tree_json(drive: &Drive, folder: Option<EntryId>) -> Vec<TreeNode<'_>> {
    let options = drive.list_options();
    drive
        .list(folder, &options)
        .into_iter()
        .map(|entry| TreeNode {
            entry,
            children: if entry.is_folder() {
                tree_json(drive, Some(entry.id))
            } else {
                Vec::new()
            },
        })
        .collect()
}

#[derive(Serialize)]
struct SearchHit<'a> {
    #[serde(flatten)]
    entry: &'a Entry,
    location: String,
}
