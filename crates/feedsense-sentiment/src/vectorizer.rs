//! Text → feature transform backed by a fitted TF-IDF vocabulary.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use serde::Deserialize;

use crate::error::InferenceError;
use crate::features::FeatureVector;

/// Turns raw feedback text into a fixed-dimension feature vector.
pub trait TextVectorizer: Send + Sync + std::fmt::Debug {
    /// Width of every vector this vectorizer produces.
    fn n_features(&self) -> usize;

    /// # Errors
    ///
    /// Returns [`InferenceError`] only when internal state is unusable.
    fn transform(&self, text: &str) -> Result<FeatureVector, InferenceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

/// On-disk form of a fitted TF-IDF vectorizer.
#[derive(Debug, Clone, Deserialize)]
pub struct TfidfArtifact {
    pub vocabulary: HashMap<String, usize>,
    #[serde(default)]
    pub idf: Option<Vec<f64>>,
    #[serde(default = "default_true")]
    pub lowercase: bool,
    #[serde(default = "default_token_pattern")]
    pub token_pattern: String,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub stop_words: Option<Vec<String>>,
    #[serde(default)]
    pub sublinear_tf: bool,
    #[serde(default = "default_true")]
    pub use_idf: bool,
    #[serde(default = "default_norm")]
    pub norm: Option<Norm>,
}

fn default_true() -> bool {
    true
}

fn default_token_pattern() -> String {
    r"(?u)\b\w\w+\b".to_string()
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

#[allow(clippy::unnecessary_wraps)]
fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

#[derive(Debug)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Option<Vec<f64>>,
    n_features: usize,
    lowercase: bool,
    token_pattern: Regex,
    use_capture_group: bool,
    ngram_range: (usize, usize),
    stop_words: HashSet<String>,
    sublinear_tf: bool,
    norm: Option<Norm>,
}

impl TfidfVectorizer {
    /// Validate an artifact and compile it into a usable vectorizer.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the artifact is internally
    /// inconsistent; the caller attaches the artifact path.
    pub fn from_artifact(artifact: TfidfArtifact) -> Result<Self, String> {
        let (min_n, max_n) = artifact.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(format!(
                "ngram_range ({min_n}, {max_n}) must satisfy 1 <= min <= max"
            ));
        }

        let token_pattern = Regex::new(&artifact.token_pattern)
            .map_err(|e| format!("token_pattern does not compile: {e}"))?;
        let use_capture_group = match token_pattern.captures_len() {
            1 => false,
            2 => true,
            _ => return Err("token_pattern has more than one capture group".to_string()),
        };

        let idf = if artifact.use_idf {
            let idf = artifact
                .idf
                .ok_or_else(|| "use_idf is set but idf weights are missing".to_string())?;
            if idf.len() != artifact.vocabulary.len() {
                return Err(format!(
                    "idf has {} weights for a vocabulary of {} terms",
                    idf.len(),
                    artifact.vocabulary.len()
                ));
            }
            if let Some(pos) = idf.iter().position(|w| !w.is_finite()) {
                return Err(format!("idf weight at column {pos} is not finite"));
            }
            Some(idf)
        } else {
            None
        };

        let n_features = artifact.vocabulary.len();
        let mut seen = HashSet::with_capacity(n_features);
        for (term, &col) in &artifact.vocabulary {
            if col >= n_features {
                return Err(format!(
                    "term '{term}' maps to column {col}, beyond {n_features} features"
                ));
            }
            if !seen.insert(col) {
                return Err(format!("column {col} is assigned to more than one term"));
            }
        }

        Ok(Self {
            vocabulary: artifact.vocabulary,
            idf,
            n_features,
            lowercase: artifact.lowercase,
            token_pattern,
            use_capture_group,
            ngram_range: (min_n, max_n),
            stop_words: artifact.stop_words.unwrap_or_default().into_iter().collect(),
            sublinear_tf: artifact.sublinear_tf,
            norm: artifact.norm,
        })
    }

    #[must_use]
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Split text into the terms looked up in the vocabulary, n-grams included.
    fn analyze(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        let tokens: Vec<&str> = if self.use_capture_group {
            self.token_pattern
                .captures_iter(&text)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str())
                .collect()
        } else {
            self.token_pattern
                .find_iter(&text)
                .map(|m| m.as_str())
                .collect()
        };

        let tokens: Vec<&str> = tokens
            .into_iter()
            .filter(|t| !self.stop_words.contains(*t))
            .collect();

        let (mut min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        if min_n == 1 {
            terms.extend(tokens.iter().map(|t| (*t).to_string()));
            min_n = 2;
        }
        for n in min_n..=max_n.min(tokens.len()) {
            terms.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        terms
    }
}

impl TextVectorizer for TfidfVectorizer {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn transform(&self, text: &str) -> Result<FeatureVector, InferenceError> {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in self.analyze(text) {
            if let Some(&col) = self.vocabulary.get(&term) {
                *counts.entry(col).or_insert(0.0) += 1.0;
            }
        }

        let mut features = FeatureVector::from_entries(self.n_features, counts.into_iter().collect());

        if self.sublinear_tf {
            features.map_values(|_, tf| 1.0 + tf.ln());
        }

        if let Some(idf) = &self.idf {
            features.map_values(|col, tf| tf * idf[col]);
        }

        let norm = match self.norm {
            Some(Norm::L2) => features
                .entries()
                .iter()
                .map(|&(_, v)| v * v)
                .sum::<f64>()
                .sqrt(),
            Some(Norm::L1) => features.entries().iter().map(|&(_, v)| v.abs()).sum(),
            None => 0.0,
        };
        if norm > 0.0 {
            features.scale(1.0 / norm);
        }

        Ok(features)
    }
}
