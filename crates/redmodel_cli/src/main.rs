//! redmodel CLI
//!
//! Command-line tools for examining entities stored by redmodel.
//!
//! # Commands
//!
//! - `inspect` - Display an entity's data, unique keys and type counter
//! - `lookup` - Find the id that owns a unique value
//! - `audit` - Verify unique-key bookkeeping

mod commands;

use clap::{Parser, Subcommand};
use redmodel_store::{StoreConfig, DEFAULT_REDIS_URL};
use tracing_subscriber::EnvFilter;

/// redmodel command-line tools.
#[derive(Parser)]
#[command(name = "redmodel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Redis connection URL
    #[arg(global = true, short, long, default_value = DEFAULT_REDIS_URL)]
    url: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display an entity's stored data, reverse key set and type counter
    Inspect {
        /// Entity type name
        #[arg(short = 't', long = "type")]
        entity_type: String,

        /// Entity id
        #[arg(short, long)]
        id: u64,

        /// Encoding of stored data (json, cbor)
        #[arg(short, long, default_value = "json")]
        encoding: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print the id that owns a unique value
    Lookup {
        /// Entity type name
        #[arg(short = 't', long = "type")]
        entity_type: String,

        /// Unique field name
        #[arg(short, long)]
        field: String,

        /// Value as it appears in the unique key
        #[arg(long)]
        value: String,
    },

    /// Verify that unique keys and reverse key sets agree
    Audit {
        /// Entity type name
        #[arg(short = 't', long = "type")]
        entity_type: String,

        /// Entity id (all issued ids if omitted)
        #[arg(short, long)]
        id: Option<u64>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = StoreConfig::redis(cli.url);
    match cli.command {
        Commands::Inspect {
            entity_type,
            id,
            encoding,
            format,
        } => {
            let mut store = config.open()?.connect(&entity_type)?;
            commands::inspect::run(&mut *store, &entity_type, id, &encoding, &format)?;
        }
        Commands::Lookup {
            entity_type,
            field,
            value,
        } => {
            let mut store = config.open()?.connect(&entity_type)?;
            commands::lookup::run(&mut *store, &entity_type, &field, &value)?;
        }
        Commands::Audit { entity_type, id } => {
            let mut store = config.open()?.connect(&entity_type)?;
            commands::audit::run(&mut *store, &entity_type, id)?;
        }
        Commands::Version => {
            println!("redmodel CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
