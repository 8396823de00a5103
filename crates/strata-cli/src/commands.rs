use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::json;
use strata_types::InventoryNode;
use tracing::{debug, info};

use crate::cli::{ChecksumArgs, Cli, Command, FmtArgs, OutputFormat, ParseArgs};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Parse(args) => cmd_parse(args, cli.format),
        Command::Fmt(args) => cmd_fmt(args),
        Command::Checksum(args) => cmd_checksum(args, cli.format),
    }
}

/// Read and parse an inventory text file. Invalid UTF-8 is replaced rather
/// than rejected, matching how the text arrives off the wire.
fn load(path: &Path) -> anyhow::Result<(String, Vec<InventoryNode>)> {
    let raw = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let text = String::from_utf8_lossy(&raw).into_owned();
    let nodes = strata_text::parse(&text).with_context(|| format!("parsing {}", path.display()))?;
    debug!(path = %path.display(), records = nodes.len(), "loaded inventory text");
    Ok((text, nodes))
}

fn cmd_parse(args: ParseArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (_, nodes) = load(&args.file)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&nodes)?),
        OutputFormat::Text => print!("{}", render_listing(&nodes)),
    }
    Ok(())
}

fn cmd_fmt(args: FmtArgs) -> anyhow::Result<()> {
    let (text, nodes) = load(&args.file)?;
    let canonical = strata_text::serialize(&nodes);

    if args.check {
        if canonical != text {
            bail!("{} is not in canonical layout", args.file.display());
        }
        println!("{} {}", "✓".green().bold(), args.file.display());
    } else if args.write {
        if canonical == text {
            info!(path = %args.file.display(), "already canonical");
            return Ok(());
        }
        fs::write(&args.file, &canonical).with_context(|| format!("writing {}", args.file.display()))?;
        println!("{} Rewrote {} ({} records)", "✓".green().bold(), args.file.display(), nodes.len());
    } else {
        print!("{canonical}");
    }
    Ok(())
}

fn cmd_checksum(args: ChecksumArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (_, nodes) = load(&args.file)?;
    let sums: Vec<_> = nodes
        .iter()
        .filter_map(InventoryNode::as_item)
        .map(|item| (item.id, item.name.as_str(), item.checksum()))
        .collect();

    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = sums
                .iter()
                .map(|(id, name, crc)| json!({ "id": id, "name": name, "checksum": crc }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text => {
            for (id, name, crc) in &sums {
                println!("{}  {}  {}", format!("{crc:08x}").yellow(), id.to_string().dimmed(), name);
            }
        }
    }
    Ok(())
}

/// One line per record in file order, then a count summary.
fn render_listing(nodes: &[InventoryNode]) -> String {
    let mut out = String::new();
    let folders = nodes.iter().filter(|n| n.is_folder()).count();
    for node in nodes {
        let line = match node {
            InventoryNode::Folder(folder) => format!(
                "{} {}  {}",
                "folder".blue().bold(),
                folder.name.bold(),
                folder.id.to_string().dimmed()
            ),
            InventoryNode::Item(item) => format!(
                "{} {}  {}  {}",
                "item  ".green(),
                item.name,
                item.asset_type.name().cyan(),
                item.id.to_string().dimmed()
            ),
        };
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str(&format!("{} folders, {} items\n", folders, nodes.len() - folders));
    out
}
