use std::path::Path;

use anyhow::{Context, Result, anyhow};
use rand::Rng;

/// Immutable pool of secret words.
///
/// Construction fails on an empty pool, so picking a word never can.
#[derive(Debug, Clone)]
pub struct WordSource {
    words: Vec<String>,
}

impl WordSource {
    pub fn new<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();

        if words.is_empty() {
            return Err(anyhow!("Word pool is empty"));
        }

        Ok(Self { words })
    }

    /// Newline separated list; blank lines and `#` comments are skipped.
    pub fn from_word_list(word_list: &str) -> Result<Self> {
        Self::new(
            word_list
                .lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#')),
        )
    }

    /// JSON array of strings, e.g. `["casa", "perro"]`.
    pub fn from_json(json: &str) -> Result<Self> {
        let words: Vec<String> =
            serde_json::from_str(json).context("Word file is not a JSON array of strings")?;
        Self::new(words)
    }

    /// Loads a `.json` array or a plain word list, chosen by file extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read word file {}", path.display()))?;

        let source = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_word_list(&contents),
        }
        .with_context(|| format!("Invalid word file {}", path.display()))?;

        tracing::info!("Loaded {} words from {}", source.len(), path.display());
        Ok(source)
    }

    pub fn pick_random<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        let index = rng.random_range(0..self.words.len());
        &self.words[index]
    }

    pub fn contains(&self, word: &str) -> bool {
        let word = word.trim().to_lowercase();
        self.words.iter().any(|w| w.to_lowercase() == word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
