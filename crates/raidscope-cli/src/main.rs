mod commands;
mod input;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use raidscope_core::{Config, Offsets};
use tracing::info;
use tracing_subscriber::EnvFilter;

use commands::hex_utils::parse_hex_address;
use commands::source::SnapshotArgs;

#[derive(Parser)]
#[command(name = "raidscope")]
#[command(about = "Remote process memory introspection for live match sessions")]
struct Args {
    #[arg(short, long, global = true, default_value = "config.json")]
    config: PathBuf,

    #[arg(short, long, global = true, default_value = "offsets.json")]
    offsets: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Follow the session and print its entities until Esc or q
    Run {
        #[command(flatten)]
        source: SnapshotArgs,

        /// Print entities as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Search the object registry for a named object
    Walk {
        #[command(flatten)]
        source: SnapshotArgs,

        /// Object name to search for (defaults to the configured world object)
        name: Option<String>,

        /// Follow the world chain from the found object
        #[arg(long)]
        world: bool,
    },

    /// Resolve a pointer chain hop by hop
    Chain {
        #[command(flatten)]
        source: SnapshotArgs,

        /// Start address (hex)
        #[arg(value_parser = parse_hex_address)]
        base: u64,

        /// Offsets to follow (hex)
        #[arg(value_name = "OFFSET", value_parser = parse_hex_address, num_args = 1..)]
        hops: Vec<u64>,

        #[arg(long)]
        json: bool,
    },

    /// Dump raw bytes from the snapshot
    Hexdump {
        #[command(flatten)]
        source: SnapshotArgs,

        /// Address to dump (hex)
        #[arg(value_parser = parse_hex_address)]
        address: u64,

        /// Number of bytes
        #[arg(short, long, default_value_t = 256)]
        size: usize,

        /// Show the ASCII column
        #[arg(short, long)]
        ascii: bool,
    },

    /// Inspect a memory region table
    Mmap {
        path: PathBuf,

        /// Show the region containing this address (hex)
        #[arg(value_parser = parse_hex_address)]
        address: Option<u64>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("raidscope=info".parse()?))
        .init();

    let args = Args::parse();

    match &args.command {
        Command::Run { source, json } => {
            let config = load_config(&args.config)?;
            let offsets = load_offsets(&args.offsets)?;
            commands::run::run(source, &config, offsets, *json)
        }
        Command::Walk {
            source,
            name,
            world,
        } => {
            let config = load_config(&args.config)?;
            let offsets = load_offsets(&args.offsets)?;
            commands::walk::run(source, &config, &offsets, name.as_deref(), *world)
        }
        Command::Chain {
            source,
            base,
            hops,
            json,
        } => commands::chain::run(source, *base, hops, *json),
        Command::Hexdump {
            source,
            address,
            size,
            ascii,
        } => commands::hexdump::run(source, *address, *size, *ascii),
        Command::Mmap { path, address } => commands::mmap::run(path, *address),
    }
}

fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load_or_default(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

fn load_offsets(path: &Path) -> Result<Offsets> {
    let offsets = raidscope_core::load_offsets(path)
        .with_context(|| format!("Failed to load offsets from {}", path.display()))?;
    info!("Loaded offsets version: {}", offsets.version);
    Ok(offsets)
}
