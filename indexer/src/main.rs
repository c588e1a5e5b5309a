use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use search_core::{remove_duplicates, DocumentStatus, ExecutionPolicy, SearchServer, SearchServerConfig, StopWords};
use search_indexer::{load_path, match_all, read_queries, run_queries};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "search-indexer")]
#[command(about = "Index JSONL documents in memory and run TF-IDF queries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct IndexArgs {
    /// Input path (.jsonl file or directory of .jsonl files)
    #[arg(long)]
    input: PathBuf,
    /// Space-separated stop words
    #[arg(long, default_value = "")]
    stop_words: String,
    /// Shards of the parallel relevance accumulator
    #[arg(long, default_value_t = SearchServerConfig::default().shard_count)]
    shards: usize,
    /// Fan searches out over the thread pool
    #[arg(long, default_value_t = false)]
    parallel: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load documents and answer queries, printing one JSON line per query
    Search {
        #[command(flatten)]
        index: IndexArgs,
        /// Query to run; may be repeated
        #[arg(long = "query")]
        queries: Vec<String>,
        /// File with one query per line
        #[arg(long)]
        queries_file: Option<PathBuf>,
        /// Only return documents with this status
        #[arg(long, value_enum, default_value_t = StatusArg::Actual)]
        status: StatusArg,
        /// Remove documents with identical word sets before searching
        #[arg(long, default_value_t = false)]
        dedup: bool,
        /// Size of the request log window
        #[arg(long, default_value_t = search_core::MIN_IN_DAY)]
        window: usize,
    },
    /// Show which query words every document matches
    Match {
        #[command(flatten)]
        index: IndexArgs,
        #[arg(long)]
        query: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Actual,
    Irrelevant,
    Banned,
    Removed,
}

impl From<StatusArg> for DocumentStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Actual => DocumentStatus::Actual,
            StatusArg::Irrelevant => DocumentStatus::Irrelevant,
            StatusArg::Banned => DocumentStatus::Banned,
            StatusArg::Removed => DocumentStatus::Removed,
        }
    }
}

impl IndexArgs {
    fn policy(&self) -> ExecutionPolicy {
        if self.parallel {
            ExecutionPolicy::Parallel
        } else {
            ExecutionPolicy::Sequential
        }
    }

    fn build(&self) -> Result<SearchServer> {
        let stop_words = StopWords::from_text(&self.stop_words)?;
        let mut server = SearchServer::with_config(stop_words, SearchServerConfig { shard_count: self.shards });
        load_path(&self.input, &mut server)?;
        Ok(server)
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Search { index, mut queries, queries_file, status, dedup, window } => {
            let mut server = index.build()?;
            if dedup {
                let removed = remove_duplicates(&mut server);
                tracing::info!(removed = removed.len(), remaining = server.document_count(), "removed duplicates");
            }
            if let Some(path) = queries_file {
                queries.extend(read_queries(&path)?);
            }
            let out = BufWriter::new(io::stdout().lock());
            let summary = run_queries(&server, &queries, status.into(), index.policy(), window, out)?;
            tracing::info!(
                answered = summary.answered,
                failed = summary.failed,
                no_result_requests = summary.no_result_requests,
                "queries complete"
            );
            Ok(())
        }
        Commands::Match { index, query } => {
            let server = index.build()?;
            let out = BufWriter::new(io::stdout().lock());
            match_all(&server, &query, index.policy(), out)
        }
    }
}
