//! tabjson: Export the tables of a database as one JSON document
//!
//! Usage:
//!   # List tables and columns
//!   tabjson info --db data.db
//!
//!   # Whole database to stdout
//!   tabjson json --db data.db
//!
//!   # Selected tables, identifier-safe keys, numbers coerced, pretty file output
//!   tabjson json --db data.db --tables Kunder,Ädress --normalize --coerce-numbers \
//!       --keep Adress.Postnr --pretty --output out.json

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tabjson::info::{describe_tables, describe_tables_json};
use tabjson::logging::init_logging;
use tabjson::{export_json, export_json_to_path, ExportOptions, OverrideRegistry, SqliteSource, TableSource};

#[derive(Parser, Debug)]
#[command(name = "tabjson")]
#[command(about = "Export relational tables as JSON", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Database file
    #[arg(long, short = 'd', value_name = "PATH")]
    db: PathBuf,

    /// Database password (needs a build with the sqlcipher feature)
    #[arg(long, short = 'p')]
    password: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List tables and their columns
    Info {
        #[command(flatten)]
        source: SourceArgs,

        /// Also show the normalized key of each table and column
        #[arg(long)]
        normalize: bool,

        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write tables as a JSON document
    Json {
        #[command(flatten)]
        source: SourceArgs,

        /// Comma-separated tables to export (default: all, in database order)
        #[arg(long, short = 't', value_delimiter = ',')]
        tables: Vec<String>,

        /// Output file (stdout if omitted)
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,

        /// Indent the output
        #[arg(long)]
        pretty: bool,

        /// Rewrite table and column names into identifier-safe keys
        #[arg(long)]
        normalize: bool,

        /// Turn number-looking strings into JSON numbers
        #[arg(long)]
        coerce_numbers: bool,

        /// Comma-separated table.column pairs (normalized names) never coerced
        #[arg(long, value_name = "TABLE.COLUMN,...")]
        keep: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("{:#}", e);
    }

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            let configuration = err.chain().any(|cause| {
                cause
                    .downcast_ref::<tabjson::Error>()
                    .map_or(false, tabjson::Error::is_configuration)
            });
            ExitCode::from(if configuration { 2 } else { 1 })
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Info { source, normalize, json } => {
            let db = open_source(&source)?;
            let tables = db.tables().context("Failed to read table metadata")?;

            let mut out = io::stdout().lock();
            if json {
                describe_tables_json(&tables, normalize, &mut out)?;
            } else {
                describe_tables(&tables, normalize, &mut out)?;
            }
            out.flush()?;
        }
        Command::Json {
            source,
            tables,
            output,
            pretty,
            normalize,
            coerce_numbers,
            keep,
        } => {
            // Validate overrides before touching the database
            let overrides = match keep {
                Some(list) => OverrideRegistry::parse(&list)?,
                None => OverrideRegistry::new(),
            };

            let options = ExportOptions::default()
                .with_tables(tables)
                .with_pretty(pretty)
                .with_normalized_names(normalize)
                .with_number_coercion(coerce_numbers)
                .with_overrides(overrides);

            let db = open_source(&source)?;
            match output {
                Some(path) => export_json_to_path(&db, &options, &path)
                    .with_context(|| format!("Failed to write output file: {}", path.display()))?,
                None => {
                    export_json(&db, &options, BufWriter::new(io::stdout().lock()))?;
                }
            }
        }
    }

    Ok(())
}

fn open_source(args: &SourceArgs) -> Result<SqliteSource> {
    let source = SqliteSource::open(&args.db, args.password.as_deref())?;
    Ok(source)
}
