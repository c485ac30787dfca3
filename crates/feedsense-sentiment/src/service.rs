//! Sentiment inference over a loaded [`ModelBundle`].

use crate::bundle::ModelBundle;
use crate::error::InferenceError;
use crate::label::SentimentLabel;

/// Classify one piece of feedback.
///
/// Text → feature vector → raw class index → [`SentimentLabel`]. Empty text is
/// ordinary input. An index outside the fixed lookup yields
/// [`SentimentLabel::Unknown`].
///
/// # Errors
///
/// Returns [`InferenceError`] only when the bundle's internal state cannot
/// produce a prediction.
pub fn classify(bundle: &ModelBundle, text: &str) -> Result<SentimentLabel, InferenceError> {
    let features = bundle.vectorizer().transform(text)?;
    let class = bundle.classifier().predict(&features)?;
    Ok(SentimentLabel::from_class_index(class))
}

/// Classify an ordered batch of feedback rows.
///
/// Missing rows (`None`) are classified as empty text, never dropped, so
/// `result[i]` always belongs to `rows[i]`. Each row is isolated: one failing
/// row produces an `Err` at its position and the remaining rows still run.
pub fn classify_batch<'a, I>(
    bundle: &ModelBundle,
    rows: I,
) -> Vec<Result<SentimentLabel, InferenceError>>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let results: Vec<_> = rows
        .into_iter()
        .map(|row| classify(bundle, row.unwrap_or("")))
        .collect();

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        tracing::warn!(rows = results.len(), failed, "batch classified with row failures");
    } else {
        tracing::debug!(rows = results.len(), "batch classified");
    }

    results
}
