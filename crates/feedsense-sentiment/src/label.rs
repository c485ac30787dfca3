//! Mapping from raw classifier output to human-readable sentiment.

use serde::Serialize;

/// Sentiment assigned to one piece of feedback.
///
/// `Unknown` is the fallback for class indices outside the fixed lookup; it is
/// a regular value, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SentimentLabel {
    Negative,
    Neutral,
    Positive,
    Unknown,
}

impl SentimentLabel {
    /// Labels reachable through the fixed class lookup, in class-index order.
    pub const KNOWN: [SentimentLabel; 3] = [
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
        SentimentLabel::Positive,
    ];

    /// Map a raw classifier class index through `{0: Negative, 1: Neutral, 2: Positive}`.
    #[must_use]
    pub fn from_class_index(index: i64) -> Self {
        match index {
            0 => SentimentLabel::Negative,
            1 => SentimentLabel::Neutral,
            2 => SentimentLabel::Positive,
            _ => SentimentLabel::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
