use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod config;
mod crawl;
mod fetch;
mod index;

use config::CrawlConfig;
use crawl::{scheduler::Crawler, PaperRecord};
use fetch::{Fetch, StaticFetcher};
use index::{PaperIndex, QueryParams};

#[derive(Parser)]
#[command(
    name = "paper-crawl",
    about = "Crawl the citation graph of an academic paper repository, then index and query the results"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crawl outward from seed paper pages and emit a JSON array of records.
    Crawl {
        /// Seed paper page URLs (".../paper/<slug-id>").
        #[arg(required = true)]
        seeds: Vec<String>,
        /// Maximum number of distinct papers to visit.
        #[arg(long, default_value_t = config::DEFAULT_BUDGET)]
        budget: usize,
        /// Maximum references followed from any single page.
        #[arg(long, default_value_t = config::DEFAULT_FANOUT)]
        fanout: usize,
        /// Use a rendered fetch that expands collapsed abstracts and author
        /// lists (requires the `browser` build feature).
        #[arg(long)]
        rendered: bool,
        /// Per-request fetch timeout in seconds.
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
        /// Write the JSON array here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Destructively rebuild the search index from a crawl output file.
    Index {
        /// JSON array of crawled records.
        #[arg(long)]
        input: PathBuf,
        /// Index directory (created if absent, wiped if present).
        #[arg(long)]
        index_dir: PathBuf,
    },
    /// Run a weighted query against a previously built index.
    Query {
        #[arg(long)]
        index_dir: PathBuf,
        /// Title phrase to match.
        #[arg(long)]
        title: Option<String>,
        #[arg(long, default_value_t = 1.0)]
        title_weight: f32,
        /// Abstract phrase to match.
        #[arg(long = "abstract")]
        abstract_query: Option<String>,
        #[arg(long, default_value_t = 1.0)]
        abstract_weight: f32,
        /// Minimum publication year.
        #[arg(long)]
        min_year: Option<i64>,
        #[arg(long, default_value_t = 1.0)]
        year_weight: f32,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

fn build_fetcher(config: &CrawlConfig) -> anyhow::Result<Arc<dyn Fetch>> {
    if config.rendered {
        #[cfg(feature = "browser")]
        {
            return Ok(Arc::new(fetch::browser::RenderedFetcher::new(
                config.fetch_timeout,
            )));
        }
        #[cfg(not(feature = "browser"))]
        anyhow::bail!("rendered fetches need a build with the `browser` feature");
    }
    Ok(Arc::new(StaticFetcher::new(
        config.fetch_timeout,
        config.retry_max_elapsed,
    )?))
}

async fn run_crawl(
    seeds: Vec<String>,
    config: CrawlConfig,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let fetcher = build_fetcher(&config)?;
    let crawler = Crawler::new(fetcher, config)?;
    let records = crawler.run(&seeds).await;
    tracing::info!(count = records.len(), "crawl finished");

    let json = serde_json::to_string_pretty(&records)?;
    match output {
        Some(path) => std::fs::write(&path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}

fn run_index(input: PathBuf, index_dir: PathBuf) -> anyhow::Result<()> {
    let data = std::fs::read_to_string(&input)?;
    let records: Vec<PaperRecord> = serde_json::from_str(&data)?;
    let mut index = PaperIndex::create_or_open(&index_dir)?;
    index.rebuild(&records)?;
    tracing::info!(count = index.count(), "index rebuilt");
    Ok(())
}

fn run_query(index_dir: PathBuf, params: QueryParams, limit: usize) -> anyhow::Result<()> {
    let index = PaperIndex::create_or_open(&index_dir)?;
    let hits = index.query(&params, limit)?;
    println!("{}", serde_json::to_string_pretty(&hits)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    match Cli::parse().command {
        Command::Crawl {
            seeds,
            budget,
            fanout,
            rendered,
            timeout_secs,
            output,
        } => {
            let config = CrawlConfig {
                budget,
                fanout,
                rendered,
                fetch_timeout: Duration::from_secs(timeout_secs),
                ..CrawlConfig::default()
            };
            run_crawl(seeds, config, output).await
        }
        Command::Index { input, index_dir } => run_index(input, index_dir),
        Command::Query {
            index_dir,
            title,
            title_weight,
            abstract_query,
            abstract_weight,
            min_year,
            year_weight,
            limit,
        } => {
            let params = QueryParams {
                title,
                title_weight,
                abstract_text: abstract_query,
                abstract_weight,
                min_year,
                year_weight,
            };
            run_query(index_dir, params, limit)
        }
    }
}
