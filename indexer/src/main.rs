use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kensaku_core::build::{build_index, IndexConfig};
use kensaku_core::corpus::read_corpus;
use kensaku_core::docstore::DocumentStore;
use kensaku_core::persist::{load_meta, IndexPaths};
use kensaku_core::search::Searcher;
use kensaku_core::store::Backend;
use kensaku_core::tokenizer::TokenizerKind;
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "kensaku-indexer")]
#[command(about = "Build and inspect a full-text inverted index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Keyed,
    Snapshot,
}

#[derive(Clone, Copy, ValueEnum)]
enum TokenizerArg {
    Word,
    Whitespace,
    Ngram,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from JSON/JSONL files or a directory of them
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory; replaced on success
        #[arg(long)]
        output: String,
        #[arg(long, value_enum, default_value_t = BackendArg::Keyed)]
        backend: BackendArg,
        #[arg(long, value_enum, default_value_t = TokenizerArg::Word)]
        tokenizer: TokenizerArg,
        /// Character width for the ngram tokenizer
        #[arg(long, default_value_t = 2)]
        ngram_size: usize,
        /// Fail instead of skipping malformed documents
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Print index metadata as JSON
    Stats {
        #[arg(long, default_value = "./index")]
        index: String,
    },
    /// Run one query and print the response as JSON
    Query {
        #[arg(long, default_value = "./index")]
        index: String,
        /// Query text; terms are OR-ed
        #[arg(trailing_var_arg = true, required = true)]
        query: Vec<String>,
    },
}

#[derive(Serialize)]
struct Stats {
    root: String,
    #[serde(flatten)]
    meta: kensaku_core::persist::MetaFile,
    stored_terms: usize,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, backend, tokenizer, ngram_size, strict } => {
            let backend = match backend {
                BackendArg::Keyed => Backend::Keyed,
                BackendArg::Snapshot => Backend::Snapshot,
            };
            let tokenizer = match tokenizer {
                TokenizerArg::Word => TokenizerKind::Word,
                TokenizerArg::Whitespace => TokenizerKind::Whitespace,
                TokenizerArg::Ngram => TokenizerKind::Ngram { n: ngram_size },
            };
            let config = IndexConfig::new(&output).with_backend(backend).with_tokenizer(tokenizer);
            build(&input, &config, strict)
        }
        Commands::Stats { index } => stats(&index),
        Commands::Query { index, query } => run_query(&index, &query.join(" ")),
    }
}

fn build(input: &str, config: &IndexConfig, strict: bool) -> Result<()> {
    let corpus = read_corpus(input)?;
    for skipped in &corpus.report.skipped {
        eprintln!("skipped {} ({}): {}", skipped.path.display(), skipped.location, skipped.reason);
    }
    if strict && !corpus.report.skipped.is_empty() {
        bail!("{} malformed documents in {input}", corpus.report.skipped.len());
    }

    let documents = DocumentStore::from_corpus(corpus.pairs);
    let report = build_index(config, &documents)?;
    tracing::info!(
        num_docs = report.num_docs,
        num_terms = report.num_terms,
        num_postings = report.num_postings,
        skipped = corpus.report.skipped.len(),
        "indexed"
    );
    Ok(())
}

fn stats(index: &str) -> Result<()> {
    let paths = IndexPaths::new(index);
    let meta = load_meta(&paths)?;
    let store = meta.backend.open(&paths)?;
    let stored_terms = store.terms()?.len();
    store.close()?;
    let stats = Stats { root: index.to_string(), meta, stored_terms };
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn run_query(index: &str, query: &str) -> Result<()> {
    let searcher = Searcher::open(index)?;
    let response = searcher.respond(query)?;
    println!("{}", serde_json::to_string(&response)?);
    searcher.close()?;
    Ok(())
}
