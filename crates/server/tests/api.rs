//! End-to-end API tests against mock cloud backends.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tally_core::CandidatePolicy;
use tally_extract::BillPipeline;
use tally_genai::MockGenerator;
use tally_ocr::MockRecognizer;
use tally_server::{build_router, AppState};
use tower::ServiceExt;

const RECEIPT: &str =
    "GRAND HOTEL\nSUB TOTAL 745.00\nGST 157.05\nTOTAL 1902.05\nAmount DUE 1745.00";
const BOUNDARY: &str = "tally-test-boundary";

fn router(recognizer: MockRecognizer, generator: MockGenerator) -> Router {
    let pipeline = BillPipeline::new(recognizer, generator, CandidatePolicy::default());
    build_router(AppState::new(pipeline))
}

fn test_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(64, 64, image::Rgb([220, 220, 220]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).expect("png encode");
    out.into_inner()
}

fn multipart_upload(field: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
             filename=\"bill.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/detect-amounts")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = router(MockRecognizer::new(RECEIPT), MockGenerator::unavailable());
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn successful_detection_returns_staged_report() {
    let reply = json!({
        "amounts": [
            {"type": "total", "value": 1902.05},
            {"type": "due", "value": 1745.0}
        ],
        "confidence": 0.95
    });
    let app = router(
        MockRecognizer::new(RECEIPT),
        MockGenerator::replying(reply.to_string()),
    );

    let response = app.oneshot(multipart_upload("bill", &test_png())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["step1_ocr_extraction"]["currency_hint"], "USD");
    assert!(!body["step2_normalization"]["normalized_amounts"]
        .as_array()
        .unwrap()
        .is_empty());
    assert_eq!(body["step3_classification"]["confidence"], 0.95);
    assert_eq!(body["step4_final_output"]["status"], "ok");
    assert_eq!(body["step4_final_output"]["amounts"][0]["type"], "total");
    assert!(body["step4_final_output"]["amounts"][0]["source"]
        .as_str()
        .unwrap()
        .starts_with("text: '"));
}

#[tokio::test]
async fn missing_file_is_a_client_error() {
    let app = router(MockRecognizer::new(RECEIPT), MockGenerator::unavailable());
    let response = app
        .oneshot(multipart_upload("attachment", &test_png()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["status"], "no_amounts_found");
    assert_eq!(body["reason"], "No file uploaded");
}

#[tokio::test]
async fn blank_image_maps_to_no_amounts() {
    let app = router(MockRecognizer::blank(), MockGenerator::unavailable());
    let response = app.oneshot(multipart_upload("bill", &test_png())).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["status"], "no_amounts_found");
    assert_eq!(body["reason"], "no amounts found: OCR failed to extract text");
}

#[tokio::test]
async fn garbage_upload_is_a_server_error() {
    let app = router(MockRecognizer::new(RECEIPT), MockGenerator::unavailable());
    let response = app
        .oneshot(multipart_upload("bill", b"not an image at all"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
}
