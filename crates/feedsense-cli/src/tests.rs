use std::path::{Path, PathBuf};

use feedsense_sentiment::ModelBundle;

use super::*;

fn models_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../models")
}

fn demo_bundle() -> ModelBundle {
    let dir = models_dir();
    ModelBundle::load(&dir.join("rf_model.json"), &dir.join("tfidf_vectorizer.json"))
        .expect("demo model should load")
}

fn temp_csv(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("feedsense-cli-{}-{name}", std::process::id()));
    std::fs::write(&path, contents).expect("write temp csv");
    path
}

#[test]
fn parses_predict_command() {
    let cli = Cli::try_parse_from(["feedsense-cli", "predict", "great quality"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Predict { ref text } if text == "great quality"
    ));
    assert!(cli.model.is_none());
    assert!(cli.vectorizer.is_none());
}

#[test]
fn predict_requires_text() {
    assert!(Cli::try_parse_from(["feedsense-cli", "predict"]).is_err());
}

#[test]
fn parses_batch_with_output() {
    let cli = Cli::try_parse_from([
        "feedsense-cli",
        "batch",
        "--input",
        "in.csv",
        "--output",
        "out.csv",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Batch { ref input, output: Some(ref output) }
            if input == Path::new("in.csv") && output == Path::new("out.csv")
    ));
}

#[test]
fn batch_output_defaults_to_stdout() {
    let cli = Cli::try_parse_from(["feedsense-cli", "batch", "--input", "in.csv"])
        .expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Batch { output: None, .. }));
}

#[test]
fn batch_requires_input() {
    assert!(Cli::try_parse_from(["feedsense-cli", "batch"]).is_err());
}

#[test]
fn model_paths_are_global_flags() {
    let cli = Cli::try_parse_from([
        "feedsense-cli",
        "inspect",
        "--model",
        "m.json",
        "--vectorizer",
        "v.json",
    ])
    .expect("expected valid cli args");

    assert!(matches!(cli.command, Commands::Inspect));
    assert_eq!(cli.model.as_deref(), Some(Path::new("m.json")));
    assert_eq!(cli.vectorizer.as_deref(), Some(Path::new("v.json")));
}

#[test]
fn missing_subcommand_is_an_error() {
    assert!(Cli::try_parse_from(["feedsense-cli"]).is_err());
}

#[test]
fn blank_text_is_rejected() {
    for text in ["", "  ", "\n\t"] {
        let err = classify::validate_text(text).unwrap_err();
        assert!(err.to_string().contains("please enter valid feedback"));
    }
    assert!(classify::validate_text("fine").is_ok());
}

#[test]
fn predict_line_formats_label() {
    let bundle = demo_bundle();
    let line = classify::predict_line(&bundle, "The product quality is great").unwrap();
    assert_eq!(line, "The predicted sentiment is: Positive");
}

#[test]
fn annotate_file_classifies_rows() {
    let bundle = demo_bundle();
    let input = temp_csv("annotate.csv", "id,feedback\n1,good\n2,\n3,bad\n");
    let annotated = classify::annotate_file(&bundle, &input, 100).unwrap();
    assert_eq!(
        String::from_utf8(annotated.to_csv().unwrap()).unwrap(),
        "id,feedback,Sentiment\n1,good,Positive\n2,,Neutral\n3,bad,Negative\n"
    );

    let summary = classify::format_summary(&annotated);
    assert!(summary.contains("Positive: 1"));
    assert!(summary.contains("Neutral: 1"));
    assert!(summary.contains("Negative: 1"));
    std::fs::remove_file(input).ok();
}

#[test]
fn annotate_file_rejects_missing_feedback_column() {
    let bundle = demo_bundle();
    let input = temp_csv("no-feedback.csv", "id,comment\n1,good\n");
    let err = classify::annotate_file(&bundle, &input, 100).unwrap_err();
    assert!(format!("{err:#}").contains("'feedback'"));
    std::fs::remove_file(input).ok();
}

#[test]
fn run_batch_writes_output_file() {
    let bundle = demo_bundle();
    let input = temp_csv("batch-in.csv", "feedback\nterrible\nlove it\n");
    let output = std::env::temp_dir()
        .join(format!("feedsense-cli-{}-batch-out.csv", std::process::id()));

    classify::run_batch(&bundle, &input, Some(&output), 100).unwrap();

    let written = std::fs::read_to_string(&output).unwrap();
    let mut lines = written.lines();
    assert_eq!(lines.next(), Some("feedback,Sentiment"));
    assert_eq!(lines.count(), 2);
    std::fs::remove_file(input).ok();
    std::fs::remove_file(output).ok();
}

#[test]
fn missing_input_file_is_reported() {
    let bundle = demo_bundle();
    let err = classify::annotate_file(&bundle, Path::new("/nonexistent/feedback.csv"), 100)
        .unwrap_err();
    assert!(err.to_string().contains("failed to open"));
}
