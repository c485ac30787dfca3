//! Loading the fitted vectorizer/classifier pair from disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::LoadError;
use crate::forest::{Classifier, ClassifierArtifact, RandomForest};
use crate::label::SentimentLabel;
use crate::vectorizer::{TextVectorizer, TfidfArtifact, TfidfVectorizer};

/// Descriptive metadata about a loaded bundle.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub model_path: Option<PathBuf>,
    pub vectorizer_path: Option<PathBuf>,
    /// Hex SHA-256 of the classifier artifact bytes.
    pub model_sha256: Option<String>,
    /// Hex SHA-256 of the vectorizer artifact bytes.
    pub vectorizer_sha256: Option<String>,
    pub n_features: usize,
    pub vocabulary_size: Option<usize>,
    pub n_trees: Option<usize>,
    pub classes: Vec<ClassInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassInfo {
    pub index: i64,
    pub label: SentimentLabel,
}

/// The immutable `(vectorizer, classifier)` pair every inference call reads.
///
/// Built once, then shared by reference (or behind an `Arc`) across threads.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    vectorizer: Arc<dyn TextVectorizer>,
    classifier: Arc<dyn Classifier>,
    info: ModelInfo,
}

struct Artifact<T> {
    parsed: T,
    sha256: String,
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<Artifact<T>, LoadError> {
    let display = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            LoadError::NotFound {
                path: display.clone(),
            }
        } else {
            LoadError::Io {
                path: display.clone(),
                source: e,
            }
        }
    })?;

    let sha256 = format!("{:x}", Sha256::digest(&bytes));
    let parsed = serde_json::from_slice(&bytes).map_err(|e| LoadError::Parse {
        path: display,
        source: e,
    })?;

    Ok(Artifact { parsed, sha256 })
}

impl ModelBundle {
    /// Load and cross-check the classifier and vectorizer artifacts.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if either file is missing, unreadable, not valid
    /// JSON for its artifact type, internally inconsistent, or if the two
    /// artifacts disagree on feature width.
    pub fn load(model_path: &Path, vectorizer_path: &Path) -> Result<Self, LoadError> {
        let vectorizer_artifact: Artifact<TfidfArtifact> = read_artifact(vectorizer_path)?;
        let vectorizer = TfidfVectorizer::from_artifact(vectorizer_artifact.parsed).map_err(
            |reason| LoadError::Incompatible {
                path: vectorizer_path.display().to_string(),
                reason,
            },
        )?;

        let model_artifact: Artifact<ClassifierArtifact> = read_artifact(model_path)?;
        let ClassifierArtifact::RandomForest(forest) = model_artifact.parsed;
        let forest = RandomForest::from_artifact(forest).map_err(|reason| {
            LoadError::Incompatible {
                path: model_path.display().to_string(),
                reason,
            }
        })?;

        if vectorizer.n_features() != forest.n_features() {
            return Err(LoadError::DimensionMismatch {
                vectorizer: vectorizer.n_features(),
                classifier: forest.n_features(),
            });
        }

        let info = ModelInfo {
            model_path: Some(model_path.to_path_buf()),
            vectorizer_path: Some(vectorizer_path.to_path_buf()),
            model_sha256: Some(model_artifact.sha256),
            vectorizer_sha256: Some(vectorizer_artifact.sha256),
            n_features: vectorizer.n_features(),
            vocabulary_size: Some(vectorizer.vocabulary_size()),
            n_trees: Some(forest.n_trees()),
            classes: class_info(forest.classes()),
        };

        tracing::info!(
            model = %model_path.display(),
            vectorizer = %vectorizer_path.display(),
            model_sha256 = info.model_sha256.as_deref().unwrap_or_default(),
            vectorizer_sha256 = info.vectorizer_sha256.as_deref().unwrap_or_default(),
            vocabulary_size = vectorizer.vocabulary_size(),
            n_trees = forest.n_trees(),
            "model bundle loaded"
        );

        Ok(Self {
            vectorizer: Arc::new(vectorizer),
            classifier: Arc::new(forest),
            info,
        })
    }

    /// Assemble a bundle from already-built components.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::DimensionMismatch`] if the two disagree on width.
    pub fn from_parts(
        vectorizer: Arc<dyn TextVectorizer>,
        classifier: Arc<dyn Classifier>,
    ) -> Result<Self, LoadError> {
        if vectorizer.n_features() != classifier.n_features() {
            return Err(LoadError::DimensionMismatch {
                vectorizer: vectorizer.n_features(),
                classifier: classifier.n_features(),
            });
        }
        let info = ModelInfo {
            model_path: None,
            vectorizer_path: None,
            model_sha256: None,
            vectorizer_sha256: None,
            n_features: vectorizer.n_features(),
            vocabulary_size: None,
            n_trees: None,
            classes: class_info(classifier.classes()),
        };
        Ok(Self {
            vectorizer,
            classifier,
            info,
        })
    }

    #[must_use]
    pub fn vectorizer(&self) -> &dyn TextVectorizer {
        self.vectorizer.as_ref()
    }

    #[must_use]
    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    #[must_use]
    pub fn info(&self) -> &ModelInfo {
        &self.info
    }
}

fn class_info(classes: &[i64]) -> Vec<ClassInfo> {
    classes
        .iter()
        .map(|&index| ClassInfo {
            index,
            label: SentimentLabel::from_class_index(index),
        })
        .collect()
}
