use std::{path::Path, sync::Arc};

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use feedsense_sentiment::ModelBundle;
use tower::ServiceExt;

use super::*;

fn demo_state() -> AppState {
    let models = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../models");
    let bundle = ModelBundle::load(
        &models.join("rf_model.json"),
        &models.join("tfidf_vectorizer.json"),
    )
    .expect("demo model should load");
    AppState {
        bundle: Arc::new(bundle),
        max_feedback_chars: 1_000,
        max_batch_rows: 100,
        max_upload_bytes: 64 * 1024,
    }
}

fn app() -> Router {
    build_app(demo_state())
}

fn json_post(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn csv_post(uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from(body))
        .expect("request")
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json parse")
}

#[test]
fn api_error_maps_codes_to_statuses() {
    let cases = [
        ("validation_error", StatusCode::BAD_REQUEST),
        ("not_found", StatusCode::NOT_FOUND),
        ("payload_too_large", StatusCode::PAYLOAD_TOO_LARGE),
        ("inference_error", StatusCode::INTERNAL_SERVER_ERROR),
        ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, status) in cases {
        let response = ApiError::new("req-1", code, "boom").into_response();
        assert_eq!(response.status(), status, "code {code}");
    }
}

#[tokio::test]
async fn health_reports_model_fingerprints() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(
        json["data"]["model_sha256"].as_str().map(str::len),
        Some(64)
    );
}

#[tokio::test]
async fn model_endpoint_lists_classes() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/model")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["n_features"], 10);
    assert_eq!(json["data"]["n_trees"], 3);
    let labels: Vec<&str> = json["data"]["classes"]
        .as_array()
        .expect("classes array")
        .iter()
        .filter_map(|c| c["label"].as_str())
        .collect();
    assert_eq!(labels, ["Negative", "Neutral", "Positive"]);
}

#[tokio::test]
async fn classify_returns_label_for_text() {
    let response = app()
        .oneshot(json_post(
            "/api/v1/classify",
            &serde_json::json!({ "text": "The product quality is great" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["sentiment"], "Positive");
    assert_eq!(json["data"]["text"], "The product quality is great");
}

#[tokio::test]
async fn classify_rejects_blank_text() {
    for text in ["", "   \n\t"] {
        let response = app()
            .oneshot(json_post(
                "/api/v1/classify",
                &serde_json::json!({ "text": text }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "validation_error");
        assert!(json["error"]["message"]
            .as_str()
            .expect("message")
            .contains("please enter valid feedback"));
    }
}

#[tokio::test]
async fn classify_rejects_overlong_text() {
    let text = "good ".repeat(300);
    let response = app()
        .oneshot(json_post(
            "/api/v1/classify",
            &serde_json::json!({ "text": text }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn batch_appends_sentiment_column() {
    let response = app()
        .oneshot(csv_post(
            "/api/v1/classify/batch",
            "id,feedback\n1,good\n2,\n3,bad\n",
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["columns"], serde_json::json!(["id", "feedback", "Sentiment"]));
    assert_eq!(
        data["rows"],
        serde_json::json!([
            ["1", "good", "Positive"],
            ["2", "", "Neutral"],
            ["3", "bad", "Negative"]
        ])
    );
    assert_eq!(data["row_count"], 3);
    assert_eq!(data["failed_rows"], serde_json::json!([]));
}

#[tokio::test]
async fn batch_without_feedback_column_is_rejected() {
    let response = app()
        .oneshot(csv_post("/api/v1/classify/batch", "id,comment\n1,good\n"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "validation_error");
    assert!(json["error"]["message"]
        .as_str()
        .expect("message")
        .contains("'feedback'"));
}

#[tokio::test]
async fn batch_over_row_limit_is_rejected() {
    let mut state = demo_state();
    state.max_batch_rows = 2;
    let response = build_app(state)
        .oneshot(csv_post(
            "/api/v1/classify/batch",
            "feedback\ngood\nbad\nokay\n",
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "payload_too_large");
}

#[tokio::test]
async fn upload_over_body_limit_is_rejected() {
    let mut state = demo_state();
    state.max_upload_bytes = 16;
    let response = build_app(state)
        .oneshot(csv_post(
            "/api/v1/classify/batch",
            "feedback\nthis body is well past sixteen bytes\n",
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn export_returns_csv_attachment() {
    let response = app()
        .oneshot(csv_post(
            "/api/v1/classify/export",
            "id,feedback\n1,good\n2,\n3,bad\n",
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/csv; charset=utf-8"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"predicted_sentiments.csv\""
    );
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    assert_eq!(
        std::str::from_utf8(&body).expect("utf-8"),
        "id,feedback,Sentiment\n1,good,Positive\n2,,Neutral\n3,bad,Negative\n"
    );
}

#[tokio::test]
async fn responses_echo_request_id_in_meta() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "req-xyz")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.headers().get("x-request-id").unwrap(), "req-xyz");
    let json = body_json(response).await;
    assert_eq!(json["meta"]["request_id"], "req-xyz");
}
