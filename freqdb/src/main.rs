use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use libfreqdb::{
    compile_frequency_db, export_documents, load_raw_counts, util, AggregatorOptions,
    BulkDocsWriter, CompileOptions, Connection, ExportOptions, LoadOptions, Tagset, Variant,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_DATABASE: &str = "freqdb3g_v3";

#[derive(Debug, Parser)]
#[command(about = "Word and lemma frequency database compiler")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fill the raw count table from TSV files (plain or .bz2)
    Load {
        /// SQLite database path
        db: PathBuf,
        /// A TSV file or a directory searched for *.tsv and *.tsv.bz2
        input: PathBuf,
        /// Expect a sublemma column
        #[arg(long)]
        sublemmas: bool,
        /// Keep rows already present in the raw table
        #[arg(long)]
        append: bool,
    },
    /// Build the lemma, sublemma and word tables
    Compile {
        /// SQLite database path
        db: PathBuf,
        /// Source tagset: identity or penn
        #[arg(default_value_t = Tagset::Identity)]
        tagset: Tagset,
        /// Build the sublemma-aware variant
        #[arg(long)]
        sublemmas: bool,
        /// Cut lemmas at the first '-', '_' or '`'
        #[arg(long)]
        strip_lemma_suffix: bool,
        /// Merge into existing tables instead of recreating them
        #[arg(long)]
        keep_tables: bool,
    },
    /// Write lemma documents as CouchDB bulk bodies
    Export {
        /// SQLite database path
        db: PathBuf,
        /// Directory receiving <DATABASE>.jsonl
        target: PathBuf,
        /// Target database name
        #[arg(long, default_value = DEFAULT_DATABASE)]
        database: String,
        /// Documents per bulk write
        #[arg(long, default_value_t = libfreqdb::export::DEFAULT_BATCH_SIZE)]
        batch_size: usize,
        /// Attempts per bulk write before giving up
        #[arg(long, default_value_t = 3)]
        attempts: usize,
        /// Compress the output with bzip2
        #[arg(long)]
        compress: bool,
    },
}

fn variant(sublemmas: bool) -> Variant {
    if sublemmas {
        Variant::Sublemmas
    } else {
        Variant::Basic
    }
}

fn open_db(path: &Path) -> anyhow::Result<Connection> {
    Connection::open(path).with_context(|| format!("cannot open database {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    match args.command {
        Command::Load {
            db,
            input,
            sublemmas,
            append,
        } => {
            let mut conn = open_db(&db)?;
            let options = LoadOptions {
                variant: variant(sublemmas),
                append,
            };
            load_raw_counts(&mut conn, &input, options)
                .with_context(|| format!("loading {} failed", input.display()))?;
        }
        Command::Compile {
            db,
            tagset,
            sublemmas,
            strip_lemma_suffix,
            keep_tables,
        } => {
            let mut conn = open_db(&db)?;
            let options = CompileOptions {
                aggregator: AggregatorOptions {
                    variant: variant(sublemmas),
                    tagset,
                    strip_lemma_suffix,
                },
                drop_existing: !keep_tables,
            };
            compile_frequency_db(&mut conn, options).context("compilation failed")?;
        }
        Command::Export {
            db,
            target,
            database,
            batch_size,
            attempts,
            compress,
        } => {
            let conn = open_db(&db)?;
            std::fs::create_dir_all(&target)?;
            let extension = if compress { "jsonl.bz2" } else { "jsonl" };
            let filename = target.join(format!("{}.{}", database, extension));
            let output = util::open_output(&filename, compress)
                .with_context(|| format!("cannot create {}", filename.display()))?;
            let mut sink = BulkDocsWriter::new(output);
            let options = ExportOptions {
                batch_size,
                max_attempts: attempts,
            };
            export_documents(&conn, &mut sink, options).context("export failed")?;
            sink.into_inner().finish()?;
            info!("documents written to {}", filename.display());
        }
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
