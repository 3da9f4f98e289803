//! Link-graph PageRank by power iteration, and the text formats around it.
//!
//! Link file lines read `source;dest1,dest2,...`. The computed table is
//! written as `title=probability;name` lines, which is also what
//! [`PageRankTable`] loads for ranking.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::config::PageRankConfig;
use crate::error::Result;

/// Upper bound on the number of documents read from any pagerank input.
pub const MAX_NUMBER_OF_DOCS: usize = 2_000_000;

/// Documents and their distinct outlinks, with dense ids in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    doc_number: HashMap<String, usize>,
    doc_names: Vec<String>,
    links: Vec<BTreeSet<usize>>,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(path.as_ref())?;
        Self::read(BufReader::new(f))
    }

    pub fn read<R: BufRead>(reader: R) -> Result<Self> {
        let mut graph = Self::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let Some((source, outlinks)) = line.split_once(';') else {
                tracing::warn!(line = lineno + 1, "skipping link line without ';'");
                continue;
            };
            if graph.len() >= MAX_NUMBER_OF_DOCS {
                tracing::warn!("stopped reading since the documents table is full");
                break;
            }
            let from = graph.add_doc(source);
            for target in outlinks.split(',').filter(|t| !t.is_empty()) {
                if graph.len() >= MAX_NUMBER_OF_DOCS {
                    break;
                }
                let to = graph.add_doc(target);
                graph.add_link(from, to);
            }
        }
        tracing::info!(num_docs = graph.len(), "link graph loaded");
        Ok(graph)
    }

    /// Id of `name`, registering it if unseen.
    pub fn add_doc(&mut self, name: &str) -> usize {
        if let Some(&id) = self.doc_number.get(name) {
            return id;
        }
        let id = self.doc_names.len();
        self.doc_number.insert(name.to_string(), id);
        self.doc_names.push(name.to_string());
        self.links.push(BTreeSet::new());
        id
    }

    /// Adds an edge; a repeated edge does not raise the out-degree.
    pub fn add_link(&mut self, from: usize, to: usize) {
        self.links[from].insert(to);
    }

    pub fn len(&self) -> usize {
        self.doc_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_names.is_empty()
    }

    pub fn id(&self, name: &str) -> Option<usize> {
        self.doc_number.get(name).copied()
    }

    pub fn name(&self, id: usize) -> Option<&str> {
        self.doc_names.get(id).map(String::as_str)
    }

    pub fn out_degree(&self, id: usize) -> usize {
        self.links.get(id).map_or(0, BTreeSet::len)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDoc {
    pub name: String,
    pub probability: f64,
}

#[derive(Debug, Clone)]
pub struct PageRankRun {
    /// Documents by descending probability.
    pub ranked: Vec<RankedDoc>,
    pub iterations: usize,
    pub converged: bool,
}

pub struct PageRank;

impl PageRank {
    /// Power iteration starting with all mass on document 0.
    ///
    /// A document with outlinks sends `(1 - bored) / out` along each link
    /// plus `bored / n` to every document; a dangling document spreads its
    /// whole mass uniformly. Stops when the L1 change drops below
    /// `epsilon` or after `max_iterations`.
    pub fn compute(graph: &LinkGraph, cfg: &PageRankConfig) -> PageRankRun {
        let n = graph.len();
        if n == 0 {
            return PageRankRun { ranked: Vec::new(), iterations: 0, converged: true };
        }
        let nf = n as f64;

        let mut a = vec![0.0; n];
        a[0] = 1.0;
        let mut iterations = 0;
        let mut converged = false;
        let mut delta = f64::INFINITY;

        while iterations < cfg.max_iterations {
            iterations += 1;
            let next = Self::step(graph, &a, cfg.bored, nf);
            delta = next.iter().zip(&a).map(|(x, y)| (x - y).abs()).sum();
            a = next;
            if delta < cfg.epsilon {
                converged = true;
                break;
            }
        }
        tracing::info!(iterations, converged, delta, "pagerank finished");

        let mut ranked: Vec<RankedDoc> = a
            .into_iter()
            .enumerate()
            .map(|(i, probability)| RankedDoc {
                name: graph.doc_names[i].clone(),
                probability,
            })
            .collect();
        ranked.sort_by(|x, y| y.probability.total_cmp(&x.probability));
        PageRankRun { ranked, iterations, converged }
    }

    fn step(graph: &LinkGraph, a: &[f64], bored: f64, n: f64) -> Vec<f64> {
        // Mass every document receives regardless of links.
        let mut uniform = 0.0;
        let mut next = vec![0.0; a.len()];
        for (j, targets) in graph.links.iter().enumerate() {
            if targets.is_empty() {
                uniform += a[j] / n;
            } else {
                uniform += a[j] * bored / n;
                let share = a[j] * (1.0 - bored) / targets.len() as f64;
                for &i in targets {
                    next[i] += share;
                }
            }
        }
        for x in next.iter_mut() {
            *x += uniform;
        }
        next
    }
}

/// Mapping from graph node names (document numbers) to readable titles,
/// read from `docID;docTitle` lines.
#[derive(Debug, Clone, Default)]
pub struct TitleMap {
    titles: HashMap<String, String>,
}

impl TitleMap {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(path.as_ref())?;
        Self::read(BufReader::new(f))
    }

    pub fn read<R: BufRead>(reader: R) -> Result<Self> {
        let mut titles = HashMap::new();
        for line in reader.lines() {
            let line = line?;
            if titles.len() >= MAX_NUMBER_OF_DOCS {
                tracing::warn!("stopped reading since the titles table is full");
                break;
            }
            match line.split_once(';') {
                Some((id, title)) => {
                    titles.insert(id.to_string(), title.to_string());
                }
                None if line.trim().is_empty() => {}
                None => tracing::warn!(%line, "skipping title line without ';'"),
            }
        }
        tracing::info!(num_titles = titles.len(), "titles loaded");
        Ok(Self { titles })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.titles.get(name).map(String::as_str)
    }
}

/// Writes `title=probability;name` lines. Names without a title are written
/// as their own title.
pub fn write_pagerank_table<W: Write>(
    mut w: W,
    ranked: &[RankedDoc],
    titles: Option<&TitleMap>,
) -> Result<()> {
    for doc in ranked {
        let title = titles.and_then(|t| t.get(&doc.name)).unwrap_or(&doc.name);
        writeln!(w, "{}={};{}", title, doc.probability, doc.name)?;
    }
    w.flush()?;
    Ok(())
}

/// Precomputed pagerank scores keyed by document title.
#[derive(Debug, Clone, Default)]
pub struct PageRankTable {
    scores: HashMap<String, f64>,
}

impl PageRankTable {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(path.as_ref())?;
        Self::read(BufReader::new(f))
    }

    pub fn read<R: BufRead>(reader: R) -> Result<Self> {
        let mut scores = HashMap::new();
        let mut skipped = 0usize;
        for line in reader.lines() {
            let line = line?;
            if scores.len() >= MAX_NUMBER_OF_DOCS {
                tracing::warn!("stopped reading since the pagerank table is full");
                break;
            }
            if line.trim().is_empty() {
                continue;
            }
            match parse_table_line(&line) {
                Some((title, p)) => {
                    scores.insert(title.to_string(), p);
                }
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::warn!(skipped, "skipped malformed pagerank lines");
        }
        tracing::info!(num_docs = scores.len(), "pagerank table loaded");
        Ok(Self { scores })
    }

    pub fn get(&self, title: &str) -> Option<f64> {
        self.scores.get(title).copied()
    }

    pub fn insert(&mut self, title: impl Into<String>, probability: f64) {
        self.scores.insert(title.into(), probability);
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl From<&[RankedDoc]> for PageRankTable {
    fn from(ranked: &[RankedDoc]) -> Self {
        Self {
            scores: ranked.iter().map(|d| (d.name.clone(), d.probability)).collect(),
        }
    }
}

fn parse_table_line(line: &str) -> Option<(&str, f64)> {
    // Titles may contain '=' themselves; the score follows the last one.
    let (title, rest) = line.rsplit_once('=')?;
    let score = rest.split_once(';').map_or(rest, |(s, _)| s);
    let p = score.trim().parse().ok()?;
    Some((title, p))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(lines: &str) -> LinkGraph {
        LinkGraph::read(lines.as_bytes()).unwrap()
    }

    #[test]
    fn targets_registered_in_first_seen_order() {
        let g = graph("a;b,c\nc;a\nd;");
        assert_eq!(g.len(), 4);
        assert_eq!(g.id("a"), Some(0));
        assert_eq!(g.id("b"), Some(1));
        assert_eq!(g.id("c"), Some(2));
        assert_eq!(g.id("d"), Some(3));
        assert_eq!(g.out_degree(3), 0);
    }

    #[test]
    fn duplicate_links_count_once() {
        let g = graph("a;b,b,c\na;b");
        assert_eq!(g.out_degree(0), 2);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let g = graph("garbage\n\na;b");
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn probabilities_sum_to_one() {
        let g = graph("0;1,2\n1;2\n2;0\n3;0,2\n4;");
        let run = PageRank::compute(&g, &PageRankConfig::default());
        let total: f64 = run.ranked.iter().map(|d| d.probability).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(run.ranked.windows(2).all(|w| w[0].probability >= w[1].probability));
    }

    #[test]
    fn empty_graph() {
        let run = PageRank::compute(&LinkGraph::new(), &PageRankConfig::default());
        assert!(run.ranked.is_empty());
    }

    #[test]
    fn iteration_cap_is_respected() {
        let g = graph("0;1\n1;0");
        let cfg = PageRankConfig { max_iterations: 3, ..PageRankConfig::default() };
        let run = PageRank::compute(&g, &cfg);
        assert_eq!(run.iterations, 3);
        assert!(!run.converged);
    }

    #[test]
    fn first_step_starts_from_document_zero() {
        let g = graph("0;1\n1;0");
        let cfg = PageRankConfig { max_iterations: 1, ..PageRankConfig::default() };
        let run = PageRank::compute(&g, &cfg);
        assert_eq!(run.iterations, 1);
        assert_eq!(run.ranked[0].name, "1");
        assert!((run.ranked[0].probability - 0.925).abs() < 1e-12);
        assert_eq!(run.ranked[1].name, "0");
        assert!((run.ranked[1].probability - 0.075).abs() < 1e-12);
    }

    fn dense_step(graph: &LinkGraph, a: &[f64], bored: f64) -> Vec<f64> {
        let n = a.len();
        let nf = n as f64;
        let mut next = vec![0.0; n];
        for (i, slot) in next.iter_mut().enumerate() {
            for (j, targets) in graph.links.iter().enumerate() {
                let p = if targets.is_empty() {
                    1.0 / nf
                } else if targets.contains(&i) {
                    bored / nf + (1.0 - bored) / targets.len() as f64
                } else {
                    bored / nf
                };
                *slot += a[j] * p;
            }
        }
        next
    }

    #[test]
    fn sparse_step_matches_transition_matrix() {
        let g = graph("0;1,2\n1;2\n2;\n3;0,1,2");
        let n = g.len() as f64;
        let mut a = vec![0.4, 0.3, 0.2, 0.1];
        for _ in 0..5 {
            let sparse = PageRank::step(&g, &a, 0.15, n);
            let dense = dense_step(&g, &a, 0.15);
            for (x, y) in sparse.iter().zip(&dense) {
                assert!((x - y).abs() < 1e-12, "{sparse:?} != {dense:?}");
            }
            a = sparse;
        }
    }

    #[test]
    fn table_line_parsing() {
        assert_eq!(parse_table_line("UC_Davis.f=0.0125;245"), Some(("UC_Davis.f", 0.0125)));
        assert_eq!(parse_table_line("a=b.f=0.5;1"), Some(("a=b.f", 0.5)));
        assert_eq!(parse_table_line("no score here"), None);
        assert_eq!(parse_table_line("x=notanumber;3"), None);
    }
}
