use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use sift_core::pagerank::{write_pagerank_table, LinkGraph, PageRank, TitleMap};
use sift_core::tokenizer::{FileDocumentReader, Tokenizer};
use sift_core::{
    EngineBuilder, EngineConfig, KGramIndex, Query, QueryTerm, QueryType, RankingType, SearchEngine,
    SearchHit,
};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Index a document collection and run boolean, phrase and ranked queries", long_about = None)]
struct Cli {
    /// JSON engine configuration; unset fields keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index directories and answer one query
    Search {
        /// Directory or file to index (repeatable)
        #[arg(long = "dir", required = true)]
        dirs: Vec<PathBuf>,
        /// Query text, whitespace separated
        #[arg(long)]
        query: String,
        #[arg(long, value_enum, default_value_t = QueryKind::Ranked)]
        query_type: QueryKind,
        #[arg(long, value_enum, default_value_t = RankingKind::TfIdf)]
        ranking: RankingKind,
        /// Pagerank table (`title=probability;docID` lines)
        #[arg(long)]
        pagerank: Option<PathBuf>,
        /// File of token patterns, one regex per line
        #[arg(long)]
        patterns: Option<PathBuf>,
        /// Comma-separated result positions judged relevant; runs one feedback round
        #[arg(long, value_delimiter = ',')]
        relevant: Vec<usize>,
        /// Number of hits to print
        #[arg(long, default_value_t = 10)]
        k: usize,
    },
    /// Compute pagerank over a link graph
    Pagerank {
        /// Link file (`source;dest1,dest2,...` lines)
        #[arg(long)]
        links: PathBuf,
        /// Optional `docID;docTitle` file used to title the output
        #[arg(long)]
        titles: Option<PathBuf>,
        /// Where to write the full table
        #[arg(long)]
        output: Option<PathBuf>,
        /// Number of top documents to print
        #[arg(long, default_value_t = 30)]
        top: usize,
    },
    /// Look up the terms of a file that contain all given k-grams
    Kgram {
        /// File whose tokens make up the vocabulary
        #[arg(long)]
        file: PathBuf,
        /// Space-separated k-grams
        #[arg(long)]
        kgrams: String,
        /// K-gram length; defaults to the configured `kgram_k`
        #[arg(long)]
        k: Option<usize>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum QueryKind {
    Intersection,
    Phrase,
    Ranked,
}

impl From<QueryKind> for QueryType {
    fn from(k: QueryKind) -> Self {
        match k {
            QueryKind::Intersection => QueryType::Intersection,
            QueryKind::Phrase => QueryType::Phrase,
            QueryKind::Ranked => QueryType::Ranked,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum RankingKind {
    TfIdf,
    Pagerank,
    Combination,
}

impl From<RankingKind> for RankingType {
    fn from(k: RankingKind) -> Self {
        match k {
            RankingKind::TfIdf => RankingType::TfIdf,
            RankingKind::Pagerank => RankingType::PageRank,
            RankingKind::Combination => RankingType::Combination,
        }
    }
}

#[derive(Serialize)]
struct SearchResponse<'a> {
    query: &'a [QueryTerm],
    took_s: f64,
    total_hits: usize,
    results: &'a [SearchHit],
}

#[derive(Serialize)]
struct KGramResponse<'a> {
    kgrams: Vec<&'a str>,
    total_hits: usize,
    terms: Vec<&'a str>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Search { dirs, query, query_type, ranking, pagerank, patterns, relevant, k } => {
            if patterns.is_some() {
                config.tokenizer.patterns_file = patterns;
            }
            let engine = build_engine(&dirs, config)?;
            if let Some(path) = pagerank {
                if let Err(err) = engine.load_pagerank(&path) {
                    tracing::warn!(error = %err, "continuing without pagerank");
                }
            }
            run_search(&engine, Query::parse(&query), query_type.into(), ranking.into(), &relevant, k)
        }
        Commands::Pagerank { links, titles, output, top } => {
            run_pagerank(&links, titles.as_deref(), output.as_deref(), top, &config)
        }
        Commands::Kgram { file, kgrams, k } => {
            run_kgram(&file, &kgrams, k.unwrap_or(config.kgram_k), &config)
        }
    }
}

fn build_engine(dirs: &[PathBuf], config: EngineConfig) -> Result<SearchEngine> {
    let start = Instant::now();
    let mut builder = EngineBuilder::new(config).context("building tokenizer and k-gram index")?;
    for dir in dirs {
        for entry in WalkDir::new(dir).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if !p.is_file() {
                continue;
            }
            let text = match fs::read_to_string(p) {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(path = %p.display(), error = %err, "skipping unreadable file");
                    continue;
                }
            };
            builder.add_text(&p.to_string_lossy(), &text)?;
        }
    }
    let engine = builder.build();
    tracing::info!(elapsed_s = start.elapsed().as_secs_f64(), "indexing done");
    Ok(engine)
}

fn run_search(
    engine: &SearchEngine,
    mut query: Query,
    query_type: QueryType,
    ranking: RankingType,
    relevant: &[usize],
    k: usize,
) -> Result<()> {
    let hits = timed_search(engine, &query, query_type, ranking, k)?;
    if relevant.is_empty() {
        return Ok(());
    }
    if query_type != QueryType::Ranked {
        bail!("relevance feedback needs a ranked query");
    }

    let mut judged = vec![false; hits.len()];
    for &i in relevant {
        match judged.get_mut(i) {
            Some(slot) => *slot = true,
            None => bail!("result position {i} out of range (0..{})", hits.len()),
        }
    }
    let reader = FileDocumentReader::new(engine.tokenizer().clone());
    query.relevance_feedback(&hits, &judged, &reader, &engine.config().feedback)?;
    timed_search(engine, &query, query_type, ranking, k)?;
    Ok(())
}

fn timed_search(
    engine: &SearchEngine,
    query: &Query,
    query_type: QueryType,
    ranking: RankingType,
    k: usize,
) -> Result<Vec<SearchHit>> {
    let start = Instant::now();
    let hits = engine.search(query, query_type, ranking)?;
    let took_s = start.elapsed().as_secs_f64();
    let shown = &hits[..hits.len().min(k)];
    let resp = SearchResponse { query: query.terms(), took_s, total_hits: hits.len(), results: shown };
    print_json(&resp)?;
    Ok(hits)
}

fn run_pagerank(
    links: &Path,
    titles: Option<&Path>,
    output: Option<&Path>,
    top: usize,
    config: &EngineConfig,
) -> Result<()> {
    let graph = LinkGraph::from_file(links)
        .with_context(|| format!("reading link graph {}", links.display()))?;
    let run = PageRank::compute(&graph, &config.pagerank);
    tracing::info!(iterations = run.iterations, converged = run.converged, "pagerank computed");

    let title_map = match titles {
        Some(path) => match TitleMap::from_file(path) {
            Ok(map) => Some(map),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "could not read titles, using node names");
                None
            }
        },
        None => None,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for doc in run.ranked.iter().take(top) {
        let name = title_map.as_ref().and_then(|t| t.get(&doc.name)).unwrap_or(&doc.name);
        writeln!(out, "{}: {:.5}", name, doc.probability)?;
    }

    if let Some(path) = output {
        let f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        write_pagerank_table(BufWriter::new(f), &run.ranked, title_map.as_ref())?;
        tracing::info!(output = %path.display(), "pagerank table written");
    }
    Ok(())
}

fn run_kgram(file: &Path, kgrams: &str, k: usize, config: &EngineConfig) -> Result<()> {
    let tokenizer = Tokenizer::new(&config.tokenizer)?;
    let text = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let mut index = KGramIndex::new(k)?;
    for token in tokenizer.tokens(&text) {
        index.insert(&token);
    }

    let grams: Vec<&str> = kgrams.split_whitespace().collect();
    let ids = index.search(&grams)?;
    let resp = KGramResponse { total_hits: ids.len(), terms: index.terms_for(&ids), kgrams: grams };
    print_json(&resp)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
