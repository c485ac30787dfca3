use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use feedsense_sentiment::{
    classify, classify_table, AnnotatedTable, BatchValidationError, FeedbackTable,
    InferenceError, SentimentLabel, EXPORT_FILE_NAME,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct ClassifyRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ClassifyItem {
    pub text: String,
    pub sentiment: SentimentLabel,
}

#[derive(Debug, Serialize)]
pub(super) struct LabelCount {
    pub label: SentimentLabel,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub(super) struct FailedRow {
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub(super) struct BatchResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub row_count: usize,
    pub skipped_rows: usize,
    pub summary: Vec<LabelCount>,
    pub failed_rows: Vec<FailedRow>,
}

impl From<AnnotatedTable> for BatchResult {
    fn from(table: AnnotatedTable) -> Self {
        Self {
            columns: table.headers().to_vec(),
            rows: table.rows().to_vec(),
            row_count: table.rows().len(),
            skipped_rows: table.skipped_rows(),
            summary: table
                .label_counts()
                .into_iter()
                .map(|(label, count)| LabelCount { label, count })
                .collect(),
            failed_rows: table
                .failures()
                .iter()
                .map(|f| FailedRow {
                    row: f.row,
                    message: f.error.to_string(),
                })
                .collect(),
        }
    }
}

fn map_inference_error(request_id: String, error: &InferenceError) -> ApiError {
    tracing::error!(error = %error, "inference failed");
    ApiError::new(
        request_id,
        "inference_error",
        format!("an error occurred during prediction: {error}"),
    )
}

fn map_batch_error(request_id: String, error: &BatchValidationError) -> ApiError {
    tracing::info!(error = %error, "rejected CSV upload");
    match error {
        BatchValidationError::MissingFeedbackColumn => {
            ApiError::new(request_id, "validation_error", error.to_string())
        }
        BatchValidationError::Csv(e) => ApiError::new(
            request_id,
            "validation_error",
            format!("could not parse the uploaded CSV file: {e}"),
        ),
        BatchValidationError::TooManyRows { .. } => {
            ApiError::new(request_id, "payload_too_large", error.to_string())
        }
    }
}

pub(super) async fn classify_text(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ClassifyRequest>,
) -> Result<Json<ApiResponse<ClassifyItem>>, ApiError> {
    if body.text.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "please enter valid feedback text to predict sentiment",
        ));
    }

    let chars = body.text.chars().count();
    if chars > state.max_feedback_chars {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!(
                "feedback is {chars} characters; at most {} are accepted",
                state.max_feedback_chars
            ),
        ));
    }

    let sentiment = classify(&state.bundle, &body.text)
        .map_err(|e| map_inference_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ClassifyItem {
            text: body.text,
            sentiment,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Parse and classify an uploaded CSV off the async runtime.
async fn annotate_upload(
    state: &AppState,
    request_id: &str,
    body: Bytes,
) -> Result<AnnotatedTable, ApiError> {
    let bundle = Arc::clone(&state.bundle);
    let max_rows = state.max_batch_rows;

    let outcome = tokio::task::spawn_blocking(move || {
        let table = FeedbackTable::from_csv_bytes(&body)?;
        classify_table(&bundle, table, max_rows)
    })
    .await;

    match outcome {
        Ok(Ok(annotated)) => {
            tracing::info!(
                rows = annotated.rows().len(),
                skipped = annotated.skipped_rows(),
                failed = annotated.failures().len(),
                "classified CSV upload"
            );
            Ok(annotated)
        }
        Ok(Err(e)) => Err(map_batch_error(request_id.to_string(), &e)),
        Err(e) => {
            tracing::error!(error = %e, "batch classification task failed");
            Err(ApiError::new(
                request_id,
                "internal_error",
                "an error occurred while processing the file",
            ))
        }
    }
}

pub(super) async fn classify_csv(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<ApiResponse<BatchResult>>, ApiError> {
    let annotated = annotate_upload(&state, &req_id.0, body).await?;

    Ok(Json(ApiResponse {
        data: BatchResult::from(annotated),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn export_csv(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let annotated = annotate_upload(&state, &req_id.0, body).await?;

    let csv = annotated.to_csv().map_err(|e| {
        tracing::error!(error = %e, "failed to serialize annotated CSV");
        ApiError::new(
            req_id.0.clone(),
            "internal_error",
            "failed to serialize the results CSV",
        )
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
            ),
        ],
        csv,
    )
        .into_response())
}
