//! Command-line interface for the parser.
//!
//! Status output goes to stderr so that converted rows can be piped from
//! stdout.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::Result;
use crate::fields::{FieldPreset, FieldSchema};
use crate::namespaces::NamespaceTable;
use crate::registry::EntityKind;
use crate::stream::{ParserOptions, PrgParser};

/// Rows between spinner updates.
const PROGRESS_INTERVAL: u64 = 1000;

/// PRG Parser - Convert PRG address-registry GML exports into flat rows.
#[derive(Parser)]
#[command(name = "prg-parser")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stream a PRG file and write one JSON row per line.
    Convert {
        /// PRG XML file to convert
        file: PathBuf,

        /// Use the basic field schema (no audit or component fields)
        #[arg(long)]
        basic: bool,

        /// Field to drop from every entity kind (repeatable)
        #[arg(short = 'x', long = "exclude")]
        exclude: Vec<String>,

        /// Entity kind to emit: ja, msc, ul, pa or a full label (repeatable; default: all)
        #[arg(short, long = "kind")]
        kind: Vec<EntityKind>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the ordered output columns of each entity kind.
    Fields {
        /// Use the basic field schema
        #[arg(long)]
        basic: bool,

        /// Field to drop from every entity kind (repeatable)
        #[arg(short = 'x', long = "exclude")]
        exclude: Vec<String>,
    },

    /// Print the namespaces resolved from a file's prolog.
    Namespaces {
        /// PRG XML file to inspect
        file: PathBuf,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            file,
            basic,
            exclude,
            kind,
            output,
        } => convert_command(&file, basic, exclude, kind, output.as_deref()),
        Commands::Fields { basic, exclude } => fields_command(basic, &exclude),
        Commands::Namespaces { file } => namespaces_command(&file),
    }
}

/// Execute the convert command.
fn convert_command(
    file: &Path,
    basic: bool,
    exclude: Vec<String>,
    kinds: Vec<EntityKind>,
    output: Option<&Path>,
) -> Result<()> {
    let mut options = ParserOptions::default().basic(basic).remove_fields(exclude);
    if !kinds.is_empty() {
        options = options.kinds(kinds);
    }
    let parser = PrgParser::with_options(file, options)?;

    eprintln!(
        "{} {} ({} MB)",
        style("Converting").bold(),
        style(file.display()).cyan(),
        parser.size_mb()
    );
    let labels: Vec<&str> = parser.registry().kinds().iter().map(|k| k.label()).collect();
    eprintln!("{} {}", style("Entities:").bold(), labels.join(", "));

    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message("Reading entities...");

    let mut counts: BTreeMap<EntityKind, u64> = BTreeMap::new();
    let mut stream = parser.stream()?;
    while let Some(row) = stream.next() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                pb.finish_and_clear();
                return Err(e);
            }
        };

        serde_json::to_writer(&mut out, &row)?;
        out.write_all(b"\n")?;

        *counts.entry(row.kind).or_default() += 1;
        let total = stream.stats().records;
        if total % PROGRESS_INTERVAL == 0 {
            pb.set_message(format!("{total} rows"));
        }
    }
    out.flush()?;
    pb.finish_and_clear();

    let stats = stream.stats();
    for (kind, count) in &counts {
        eprintln!("  {}: {}", kind.label(), style(count).green());
    }
    eprintln!(
        "{} {} rows (max depth {}, max {} elements held)",
        style("Done:").green().bold(),
        stats.records,
        stats.peak_open_depth,
        stats.peak_retained_nodes
    );
    if let Some(path) = output {
        eprintln!("{} {}", style("Saved to:").green().bold(), path.display());
    }

    Ok(())
}

/// Execute the fields command.
fn fields_command(basic: bool, exclude: &[String]) -> Result<()> {
    let mut schema = FieldSchema::new(FieldPreset::from_basic_flag(basic));
    schema.remove_fields(exclude)?;

    for kind in EntityKind::ALL {
        println!(
            "{} ({} columns)",
            style(kind.label()).bold(),
            schema.width(kind)
        );
        for field in schema.fields(kind) {
            println!("  {field}");
        }
    }
    Ok(())
}

/// Execute the namespaces command.
fn namespaces_command(file: &Path) -> Result<()> {
    let table = NamespaceTable::from_file(file)?;
    let rows = [
        ("prg-ad", &table.prg),
        ("gml", &table.gml),
        ("xsi", &table.xsi),
        ("bt", &table.bt),
        ("mua", &table.mua),
    ];
    for (prefix, uri) in rows {
        println!("{:<7} {}", style(prefix).cyan(), uri);
    }
    println!("{:<7} {}", style("href").cyan(), table.xlink_href());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_convert() {
        let cli = Cli::parse_from(["prg-parser", "convert", "punkty.xml"]);

        let Commands::Convert {
            file,
            basic,
            exclude,
            kind,
            output,
        } = cli.command
        else {
            unreachable!("expected convert command");
        };
        assert_eq!(file, PathBuf::from("punkty.xml"));
        assert!(!basic);
        assert!(exclude.is_empty());
        assert!(kind.is_empty());
        assert!(output.is_none());
    }

    #[test]
    fn test_cli_parse_convert_with_options() {
        let cli = Cli::parse_from([
            "prg-parser",
            "convert",
            "punkty.xml",
            "--basic",
            "-x",
            "geometry",
            "--exclude",
            "status",
            "--kind",
            "pa",
            "-k",
            "PRG_UlicaNazwa",
            "-o",
            "out.jsonl",
        ]);

        let Commands::Convert {
            basic,
            exclude,
            kind,
            output,
            ..
        } = cli.command
        else {
            unreachable!("expected convert command");
        };
        assert!(basic);
        assert_eq!(exclude, vec!["geometry", "status"]);
        assert_eq!(kind, vec![EntityKind::AddressPoint, EntityKind::Street]);
        assert_eq!(output, Some(PathBuf::from("out.jsonl")));
    }

    #[test]
    fn test_cli_rejects_unknown_kind() {
        let result = Cli::try_parse_from(["prg-parser", "convert", "a.xml", "--kind", "house"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_fields() {
        let cli = Cli::parse_from(["prg-parser", "fields", "--basic"]);
        let Commands::Fields { basic, exclude } = cli.command else {
            unreachable!("expected fields command");
        };
        assert!(basic);
        assert!(exclude.is_empty());
    }
}
