use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::Result;
use crate::tokenizer::TokenizerConfig;

/// Weight of the tf-idf score in combination ranking; the rest goes to pagerank.
pub const DEFAULT_COMBINATION_WEIGHT: f64 = 0.005;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub kgram_k: usize,
    pub combination_weight: f64,
    pub feedback: FeedbackConfig,
    pub pagerank: PageRankConfig,
    pub tokenizer: TokenizerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kgram_k: 3,
            combination_weight: DEFAULT_COMBINATION_WEIGHT,
            feedback: FeedbackConfig::default(),
            pagerank: PageRankConfig::default(),
            tokenizer: TokenizerConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(path)?;
        let cfg = serde_json::from_reader(BufReader::new(f))?;
        Ok(cfg)
    }
}

/// Rocchio constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Weight kept by the original query terms.
    pub alpha: f64,
    /// Weight given to the relevant-document centroid; `1 - alpha` when unset.
    pub beta: Option<f64>,
    /// Only this many leading results are read back for feedback.
    pub top_retrieved_docs: usize,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self { alpha: 0.2, beta: None, top_retrieved_docs: 10 }
    }
}

impl FeedbackConfig {
    pub fn beta(&self) -> f64 {
        self.beta.unwrap_or(1.0 - self.alpha)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRankConfig {
    /// Probability that the surfer jumps to a random page.
    pub bored: f64,
    /// Convergence threshold on the L1 distance between iterations.
    pub epsilon: f64,
    pub max_iterations: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self { bored: 0.15, epsilon: 0.0001, max_iterations: 100 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{ "kgram_k": 2, "feedback": { "alpha": 0.5 } }"#).unwrap();
        assert_eq!(cfg.kgram_k, 2);
        assert_eq!(cfg.combination_weight, DEFAULT_COMBINATION_WEIGHT);
        assert_eq!(cfg.feedback.top_retrieved_docs, 10);
        assert!((cfg.feedback.beta() - 0.5).abs() < 1e-12);
        assert_eq!(cfg.pagerank.max_iterations, 100);
        assert!(cfg.tokenizer.case_folding);
    }

    #[test]
    fn default_beta_complements_alpha() {
        let fb = FeedbackConfig::default();
        assert!((fb.beta() - 0.8).abs() < 1e-12);
    }
}
