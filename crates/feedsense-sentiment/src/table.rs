//! CSV intake and annotated export for batch classification.
//!
//! The inference functions know nothing about tables; this module extracts the
//! `feedback` column, hands it to [`classify_batch`], and re-attaches the labels
//! positionally as a `Sentiment` column.

use std::io::Read;

use crate::bundle::ModelBundle;
use crate::error::{BatchValidationError, InferenceError};
use crate::label::SentimentLabel;
use crate::service::classify_batch;

/// Column that must be present in every uploaded table.
pub const FEEDBACK_COLUMN: &str = "feedback";
/// Column appended (or overwritten) with the predicted label.
pub const SENTIMENT_COLUMN: &str = "Sentiment";
/// Cell value written for a row whose inference failed.
pub const ERROR_CELL: &str = "Error";
/// Suggested download name for exported results.
pub const EXPORT_FILE_NAME: &str = "predicted_sentiments.csv";

/// A parsed CSV upload: header row plus rectangular string rows.
#[derive(Debug, Clone)]
pub struct FeedbackTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    skipped_rows: usize,
}

impl FeedbackTable {
    /// Parse CSV with a header row.
    ///
    /// Rows wider than the header, or that fail to decode, are skipped. Rows
    /// narrower than the header are padded with empty cells.
    ///
    /// # Errors
    ///
    /// Returns [`BatchValidationError::Csv`] if the header row cannot be read.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, BatchValidationError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        let mut skipped_rows = 0;
        for (line, result) in csv_reader.records().enumerate() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    tracing::debug!(line = line + 2, error = %e, "skipping unreadable CSV row");
                    skipped_rows += 1;
                    continue;
                }
            };
            if record.len() > headers.len() {
                tracing::debug!(
                    line = line + 2,
                    fields = record.len(),
                    expected = headers.len(),
                    "skipping CSV row with too many fields"
                );
                skipped_rows += 1;
                continue;
            }
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        if skipped_rows > 0 {
            tracing::info!(skipped_rows, kept_rows = rows.len(), "skipped malformed CSV rows");
        }

        Ok(Self {
            headers,
            rows,
            skipped_rows,
        })
    }

    /// # Errors
    ///
    /// See [`FeedbackTable::from_reader`].
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, BatchValidationError> {
        Self::from_reader(bytes)
    }

    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of input rows dropped while parsing.
    #[must_use]
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Extract the `feedback` column in row order; blank cells are `None`.
    ///
    /// # Errors
    ///
    /// Returns [`BatchValidationError::MissingFeedbackColumn`] if the header has
    /// no `feedback` column.
    pub fn feedback_column(&self) -> Result<Vec<Option<&str>>, BatchValidationError> {
        let idx = self
            .column_index(FEEDBACK_COLUMN)
            .ok_or(BatchValidationError::MissingFeedbackColumn)?;
        Ok(self
            .rows
            .iter()
            .map(|row| Some(row[idx].as_str()).filter(|cell| !cell.is_empty()))
            .collect())
    }

    /// # Errors
    ///
    /// Returns [`BatchValidationError::TooManyRows`] above `max_rows`.
    pub fn ensure_row_limit(&self, max_rows: usize) -> Result<(), BatchValidationError> {
        if self.rows.len() > max_rows {
            return Err(BatchValidationError::TooManyRows {
                max: max_rows,
                actual: self.rows.len(),
            });
        }
        Ok(())
    }

    /// Attach one prediction per row.
    ///
    /// An existing `Sentiment` column is overwritten in place; otherwise one
    /// is appended.
    ///
    /// # Panics
    ///
    /// Panics if `predictions` does not have exactly one entry per row.
    #[must_use]
    pub fn annotate(self, predictions: Vec<Result<SentimentLabel, InferenceError>>) -> AnnotatedTable {
        assert_eq!(
            predictions.len(),
            self.rows.len(),
            "one prediction is required per row"
        );

        let mut headers = self.headers;
        let sentiment_idx = if let Some(idx) = headers.iter().position(|h| h == SENTIMENT_COLUMN) {
            idx
        } else {
            headers.push(SENTIMENT_COLUMN.to_string());
            headers.len() - 1
        };

        let mut labels = Vec::with_capacity(predictions.len());
        let mut failures = Vec::new();
        let mut rows = self.rows;
        for (row_idx, (row, prediction)) in rows.iter_mut().zip(predictions).enumerate() {
            let cell = match prediction {
                Ok(label) => {
                    labels.push(Some(label));
                    label.as_str().to_string()
                }
                Err(error) => {
                    labels.push(None);
                    failures.push(RowFailure {
                        row: row_idx,
                        error,
                    });
                    ERROR_CELL.to_string()
                }
            };
            if sentiment_idx < row.len() {
                row[sentiment_idx] = cell;
            } else {
                row.push(cell);
            }
        }

        AnnotatedTable {
            headers,
            rows,
            labels,
            failures,
            skipped_rows: self.skipped_rows,
        }
    }
}

/// A row whose inference failed, by zero-based data-row position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    pub row: usize,
    pub error: InferenceError,
}

/// Original table plus the `Sentiment` column.
#[derive(Debug, Clone)]
pub struct AnnotatedTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    labels: Vec<Option<SentimentLabel>>,
    failures: Vec<RowFailure>,
    skipped_rows: usize,
}

impl AnnotatedTable {
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Per-row label; `None` where inference failed.
    #[must_use]
    pub fn labels(&self) -> &[Option<SentimentLabel>] {
        &self.labels
    }

    #[must_use]
    pub fn failures(&self) -> &[RowFailure] {
        &self.failures
    }

    #[must_use]
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    /// Count of rows per label, in `Negative, Neutral, Positive, Unknown` order.
    #[must_use]
    pub fn label_counts(&self) -> Vec<(SentimentLabel, usize)> {
        [
            SentimentLabel::Negative,
            SentimentLabel::Neutral,
            SentimentLabel::Positive,
            SentimentLabel::Unknown,
        ]
        .into_iter()
        .map(|label| {
            let count = self.labels.iter().filter(|l| **l == Some(label)).count();
            (label, count)
        })
        .collect()
    }

    /// Serialize the annotated table back to CSV.
    ///
    /// # Errors
    ///
    /// Returns [`csv::Error`] if a record cannot be written.
    pub fn to_csv(&self) -> Result<Vec<u8>, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))
    }
}

/// Validate a parsed upload, classify its `feedback` column, and annotate it.
///
/// Validation runs before any inference: a table without a `feedback` column
/// or with more than `max_rows` rows never reaches the model.
///
/// # Errors
///
/// Returns [`BatchValidationError`] when the table is rejected.
pub fn classify_table(
    bundle: &ModelBundle,
    table: FeedbackTable,
    max_rows: usize,
) -> Result<AnnotatedTable, BatchValidationError> {
    table.ensure_row_limit(max_rows)?;
    let predictions = classify_batch(bundle, table.feedback_column()?);
    Ok(table.annotate(predictions))
}

#[cfg(test)]
#[path = "table_test.rs"]
mod tests;
