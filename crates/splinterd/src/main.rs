//! `splinterd` — command-line front-end over a local fragment store.
//!
//! # Usage
//!
//! ```text
//! splinterd put report.pdf               # ingest, prints the file id
//! splinterd put big.iso --chunk-size 4194304
//! splinterd get <file-id> -o restored.pdf
//! splinterd verify <file-id>             # reconstruct without writing
//! splinterd ls                           # list stored files
//! splinterd rm <file-id>
//! ```

mod config;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use splinter_engine::SplinterEngine;
use splinter_meta::MetaStore;
use splinter_store::{FileStore, FragmentStore, RetryStore};
use splinter_types::FileId;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use config::CliConfig;

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "splinterd", version, about = "Splinter fragmented file store")]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override data directory.
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a file and print its file id.
    Put {
        /// Path of the file to ingest.
        path: PathBuf,

        /// Fragment size in bytes for this ingest only.
        #[arg(long)]
        chunk_size: Option<u32>,
    },

    /// Reconstruct a file to stdout or an output path.
    Get {
        /// File id printed by `put`.
        file_id: String,

        /// Write the reconstructed bytes here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Reconstruct a file without writing it, reporting integrity problems.
    Verify {
        /// File id printed by `put`.
        file_id: String,
    },

    /// List stored files.
    Ls,

    /// Remove a file and all of its fragments.
    Rm {
        /// File id printed by `put`.
        file_id: String,
    },
}

// -----------------------------------------------------------------------
// Entry point
// -----------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;

    init_tracing(&config.log.level);

    let engine_config = config.engine_config()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.storage.data_dir.clone());
    debug!(data_dir = %data_dir.display(), "opening stores");

    let file_store = FileStore::new(data_dir.join("fragments"))
        .with_context(|| format!("opening fragment store under {}", data_dir.display()))?;
    let store = RetryStore::with_policy(
        Arc::new(file_store) as Arc<dyn FragmentStore>,
        config.retry_policy(),
    );
    let meta = MetaStore::open(data_dir.join("meta"))
        .with_context(|| format!("opening metadata store under {}", data_dir.display()))?;

    let engine = SplinterEngine::new(engine_config.clone(), Arc::new(store), Arc::new(meta));

    match cli.command {
        Commands::Put { path, chunk_size } => {
            let filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
                .unwrap_or_else(|| path.display().to_string());
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("opening {}", path.display()))?;

            let record = engine
                .ingest_reader(
                    &filename,
                    file,
                    chunk_size.unwrap_or(engine_config.chunk_size),
                )
                .await?;

            println!("{}", record.file_id);
            eprintln!(
                "stored {} ({} bytes, {} fragments)",
                record.filename, record.total_size, record.fragment_count
            );
        }

        Commands::Get { file_id, output } => {
            let file_id = parse_file_id(&file_id)?;
            let record = engine.head(file_id).await?;
            let data = engine.retrieve(file_id).await?;

            match output {
                Some(path) => {
                    tokio::fs::write(&path, &data)
                        .await
                        .with_context(|| format!("writing {}", path.display()))?;
                    eprintln!("restored {} to {}", record.filename, path.display());
                }
                None => std::io::stdout().write_all(&data)?,
            }
        }

        Commands::Verify { file_id } => {
            let file_id = parse_file_id(&file_id)?;
            let record = engine.head(file_id).await?;
            let data = engine.retrieve(file_id).await?;
            println!(
                "ok: {} ({} bytes across {} fragments)",
                record.filename,
                data.len(),
                record.fragment_count
            );
        }

        Commands::Ls => {
            let mut records = engine.list().await?;
            records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            for record in records {
                println!(
                    "{}  {:>12}  {:>6} fragments  {}",
                    record.file_id, record.total_size, record.fragment_count, record.filename
                );
            }
        }

        Commands::Rm { file_id } => {
            let file_id = parse_file_id(&file_id)?;
            engine.remove(file_id).await?;
            eprintln!("removed {file_id}");
        }
    }

    Ok(())
}

fn parse_file_id(raw: &str) -> anyhow::Result<FileId> {
    raw.parse()
        .with_context(|| format!("{raw:?} is not a valid file id"))
}

/// Console tracing subscriber: `RUST_LOG` wins, config level is the
/// fallback. Logs go to stderr so `get` can stream payloads to stdout.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
