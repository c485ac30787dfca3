//! Handlers for the `predict` and `batch` commands.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use feedsense_sentiment::{classify, classify_table, AnnotatedTable, FeedbackTable, ModelBundle};

/// Reject empty or whitespace-only feedback.
///
/// # Errors
///
/// Returns an error asking for valid feedback when `text` is blank.
pub(crate) fn validate_text(text: &str) -> anyhow::Result<()> {
    if text.trim().is_empty() {
        anyhow::bail!("please enter valid feedback text to predict sentiment");
    }
    Ok(())
}

/// Classify one piece of feedback and format the result line.
///
/// # Errors
///
/// Returns an error if the text is blank or inference fails.
pub(crate) fn predict_line(bundle: &ModelBundle, text: &str) -> anyhow::Result<String> {
    validate_text(text)?;
    let label = classify(bundle, text).context("an error occurred during prediction")?;
    Ok(format!("The predicted sentiment is: {label}"))
}

/// Read `input`, classify its `feedback` column, and annotate each row.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or parsed, lacks a
/// `feedback` column, or has more than `max_rows` data rows.
pub(crate) fn annotate_file(
    bundle: &ModelBundle,
    input: &Path,
    max_rows: usize,
) -> anyhow::Result<AnnotatedTable> {
    let file = File::open(input).with_context(|| format!("failed to open {}", input.display()))?;
    let table = FeedbackTable::from_reader(file)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let annotated = classify_table(bundle, table, max_rows)
        .with_context(|| format!("failed to classify {}", input.display()))?;
    Ok(annotated)
}

/// Human-readable per-label counts plus any skipped or failed rows.
pub(crate) fn format_summary(table: &AnnotatedTable) -> String {
    let mut out = String::new();
    for (label, count) in table.label_counts() {
        let _ = writeln!(out, "{label}: {count}");
    }
    if table.skipped_rows() > 0 {
        let _ = writeln!(out, "skipped malformed rows: {}", table.skipped_rows());
    }
    for failure in table.failures() {
        let _ = writeln!(out, "row {} failed: {}", failure.row, failure.error);
    }
    out
}

/// Run the `batch` command: annotate `input`, write the CSV to `output` or
/// stdout, and print the summary to stderr.
///
/// # Errors
///
/// Returns an error if the input is invalid or the output cannot be written.
pub(crate) fn run_batch(
    bundle: &ModelBundle,
    input: &Path,
    output: Option<&Path>,
    max_rows: usize,
) -> anyhow::Result<()> {
    let annotated = annotate_file(bundle, input, max_rows)?;
    let csv = annotated
        .to_csv()
        .context("failed to serialize the annotated CSV")?;

    match output {
        Some(path) => {
            std::fs::write(path, &csv)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), rows = annotated.rows().len(), "wrote annotated CSV");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&csv)?;
            stdout.flush()?;
        }
    }

    eprint!("{}", format_summary(&annotated));
    Ok(())
}
