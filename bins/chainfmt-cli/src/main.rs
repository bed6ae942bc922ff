//! chainfmt-cli: inspect block-index and undo files.
//!
//! Reads records straight from the flat files at a given offset and prints
//! them as text or JSON.

mod dump;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chainfmt_core::{BlockHeader, BlockIndexRecord, Coin, FormatConfig};
use chainfmt_store::{IndexFile, UndoFile};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

/// Block-index and undo file inspector.
#[derive(Parser, Debug)]
#[command(name = "chainfmt-cli", version, about = "Inspect block-index and undo files")]
struct Cli {
    /// Config file (default: <config dir>/chainfmt/chainfmt.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the per-transaction undo coin bound
    #[arg(long, global = true)]
    max_inputs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Dump block-index records.
    Index(IndexArgs),
    /// Dump the block undo record at an offset.
    Undo(UndoArgs),
    /// List persisted block-index fields in wire order.
    Fields,
}

#[derive(Args, Debug)]
struct IndexArgs {
    /// Block-index file.
    file: PathBuf,

    /// Record offset.
    #[arg(long, conflicts_with = "all", required_unless_present = "all")]
    offset: Option<u32>,

    /// Dump every record in the file.
    #[arg(long)]
    all: bool,

    /// Print JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct UndoArgs {
    /// Undo file.
    file: PathBuf,

    /// Record offset (the block's undo_pos).
    #[arg(long)]
    offset: u32,

    /// Print JSON instead of text.
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber on stderr.
///
/// `RUST_LOG` takes precedence over `level_str` when set.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

fn format_config(cli: &Cli) -> Result<FormatConfig> {
    let path = cli.config.clone().unwrap_or_else(settings::default_config_path);
    let cfg = settings::load(&path)?;
    let cfg = match cli.max_inputs {
        Some(max) => cfg.with_max_inputs(max),
        None => cfg,
    };
    debug!(?cfg, path = %path.display(), "format config");
    Ok(cfg)
}

fn run_index(args: &IndexArgs, cfg: FormatConfig) -> Result<()> {
    let file = IndexFile::open(&args.file, cfg)
        .with_context(|| format!("opening {}", args.file.display()))?;

    let entries: Vec<(u32, Option<i32>, BlockIndexRecord)> = match args.offset {
        Some(pos) if !args.all => {
            let (version, record) = file
                .read_versioned_at::<BlockHeader>(pos)
                .with_context(|| format!("reading index record at {pos}"))?;
            vec![(pos, Some(version), record)]
        }
        _ => file
            .load_all::<BlockHeader>()
            .context("loading block index")?
            .into_iter()
            .map(|(pos, record)| (pos, None, record))
            .collect(),
    };

    if args.json {
        let values = entries
            .iter()
            .map(|(pos, version, record)| dump::index_record_json(*pos, *version, record))
            .collect::<Result<Vec<_>>>()?;
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else {
        for (pos, version, record) in &entries {
            print!("{}", dump::index_record_text(*pos, *version, record)?);
        }
    }
    Ok(())
}

fn run_undo(args: &UndoArgs, cfg: FormatConfig) -> Result<()> {
    let file = UndoFile::open(&args.file, cfg)
        .with_context(|| format!("opening {}", args.file.display()))?;
    let undo = file
        .read_at::<Coin>(args.offset)
        .with_context(|| format!("reading block undo at {}", args.offset))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&dump::undo_json(args.offset, &undo)?)?);
    } else {
        print!("{}", dump::undo_text(args.offset, &undo)?);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, &cli.log_format);

    match &cli.command {
        Commands::Index(args) => run_index(args, format_config(&cli)?),
        Commands::Undo(args) => run_undo(args, format_config(&cli)?),
        Commands::Fields => {
            for (i, name) in BlockIndexRecord::<BlockHeader>::FIELDS.iter().enumerate() {
                println!("{i} {name}");
            }
            Ok(())
        }
    }
}
