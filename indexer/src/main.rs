use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use sitedex_core::persist::OutputFormat;
use sitedex_indexer::{build_index, summarize, BuildOptions};
use tracing_subscriber::{fmt, EnvFilter};

use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sitedex")]
#[command(about = "Build the static full-text search index for a documentation site", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a markdown tree (or a JSON/JSONL corpus) and write the search artifacts
    Build {
        /// Input path (directory of .md files, or a .json/.jsonl file)
        #[arg(long)]
        input: PathBuf,
        /// Output directory for the artifacts
        #[arg(long, env = "SITEDEX_OUTPUT")]
        output: PathBuf,
        /// Encoding of the written artifacts
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
        /// Base URL used to build canonical page links
        #[arg(long, env = "SITEDEX_SITE_URL")]
        site_url: Option<String>,
    },
    /// Print statistics of a previously built index
    Stats {
        /// Directory holding the artifacts
        #[arg(long)]
        index: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Js,
    Bincode,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Json => OutputFormat::Json,
            Format::Js => OutputFormat::Js,
            Format::Bincode => OutputFormat::Bincode,
        }
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, format, site_url } => {
            let meta = build_index(&BuildOptions { input, output, format: format.into(), site_url })?;
            tracing::info!(corpus_size = meta.corpus_size, "done");
            Ok(())
        }
        Commands::Stats { index } => {
            let summary = summarize(&index)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
    }
}
