//! Sentiment inference for customer feedback.
//!
//! Loads a fitted TF-IDF vectorizer and random-forest classifier once into an
//! immutable [`ModelBundle`], then labels feedback as Negative, Neutral, or
//! Positive, either one text at a time or as a column of an uploaded CSV that
//! is exported back with an appended `Sentiment` column.

pub mod bundle;
pub mod error;
pub mod features;
pub mod forest;
pub mod label;
pub mod service;
pub mod table;
pub mod vectorizer;

pub use bundle::{ClassInfo, ModelBundle, ModelInfo};
pub use error::{BatchValidationError, InferenceError, LoadError};
pub use features::FeatureVector;
pub use forest::{Classifier, RandomForest};
pub use label::SentimentLabel;
pub use service::{classify, classify_batch};
pub use table::{classify_table, AnnotatedTable, FeedbackTable, RowFailure, EXPORT_FILE_NAME};
pub use vectorizer::{TextVectorizer, TfidfVectorizer};
