use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};

const WORD_PATTERN: &str = r"[\p{L}\p{N}][\p{L}\p{N}_']*";

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(&format!("(?u){WORD_PATTERN}")).expect("valid regex");
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Lowercase every token.
    pub case_folding: bool,
    /// File with one regex per line for structured tokens (e-mail addresses,
    /// URLs, ...). These win over the plain word pattern.
    pub patterns_file: Option<PathBuf>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self { case_folding: true, patterns_file: None }
    }
}

#[derive(Debug, Clone)]
pub struct Tokenizer {
    re: Regex,
    case_folding: bool,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self { re: WORD_RE.clone(), case_folding: true }
    }
}

impl Tokenizer {
    pub fn new(config: &TokenizerConfig) -> Result<Self> {
        let patterns = match &config.patterns_file {
            Some(path) => read_patterns(path)?,
            None => Vec::new(),
        };
        Self::with_patterns(&patterns, config.case_folding)
    }

    /// Builds a tokenizer from in-memory patterns, tried in order before the
    /// word pattern.
    pub fn with_patterns<S: AsRef<str>>(patterns: &[S], case_folding: bool) -> Result<Self> {
        if patterns.is_empty() {
            return Ok(Self { re: WORD_RE.clone(), case_folding });
        }
        let mut alternatives = Vec::with_capacity(patterns.len() + 1);
        for p in patterns {
            let p = p.as_ref();
            Regex::new(p).map_err(|source| Error::InvalidPattern { pattern: p.to_string(), source })?;
            alternatives.push(format!("(?:{p})"));
        }
        alternatives.push(WORD_PATTERN.to_string());
        let combined = format!("(?u){}", alternatives.join("|"));
        let re = Regex::new(&combined)
            .map_err(|source| Error::InvalidPattern { pattern: combined.clone(), source })?;
        tracing::debug!(patterns = patterns.len(), "tokenizer patterns loaded");
        Ok(Self { re, case_folding })
    }

    /// NFKC-normalizes `text` and splits it into tokens.
    pub fn tokens(&self, text: &str) -> Tokens {
        let normalized = text.nfkc().collect::<String>();
        let tokens: Vec<String> = self
            .re
            .find_iter(&normalized)
            .map(|m| {
                if self.case_folding {
                    m.as_str().to_lowercase()
                } else {
                    m.as_str().to_string()
                }
            })
            .collect();
        Tokens { inner: tokens.into_iter() }
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.tokens(text).collect()
    }
}

/// Single-pass stream of tokens from one text.
#[derive(Debug)]
pub struct Tokens {
    inner: std::vec::IntoIter<String>,
}

impl Iterator for Tokens {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

fn read_patterns(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("//"))
        .map(str::to_string)
        .collect())
}

/// Supplies the token stream of a stored document, identified by the path it
/// was indexed under.
pub trait DocumentReader {
    fn read_tokens(&self, path: &str) -> Result<Vec<String>>;
}

/// Reads documents from the file system.
#[derive(Debug, Clone, Default)]
pub struct FileDocumentReader {
    tokenizer: Tokenizer,
}

impl FileDocumentReader {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self { tokenizer }
    }
}

impl DocumentReader for FileDocumentReader {
    fn read_tokens(&self, path: &str) -> Result<Vec<String>> {
        let text = fs::read_to_string(path)?;
        Ok(self.tokenizer.tokenize(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = Tokenizer::default().tokenize("Running, runner's run!");
        assert_eq!(t, vec!["running", "runner's", "run"]);
    }

    #[test]
    fn patterns_take_priority() {
        let t = Tokenizer::with_patterns(&[r"[\w.]+@[\w.]+"], true).unwrap();
        let toks = t.tokenize("Mail Jane.Doe@kth.se today");
        assert_eq!(toks, vec!["mail", "jane.doe@kth.se", "today"]);
    }

    #[test]
    fn bad_pattern_is_reported() {
        let err = Tokenizer::with_patterns(&["(unclosed"], true).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }
}
