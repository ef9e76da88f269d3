//! Request handlers.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};

use tally_genai::TextGenerator;
use tally_ocr::TextRecognizer;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok", version: env!("CARGO_PKG_VERSION") })
}

#[derive(Debug, Serialize)]
struct FailureBody {
    status: &'static str,
    reason: String,
}

fn failure(code: StatusCode, status: &'static str, reason: impl Into<String>) -> Response {
    (code, Json(FailureBody { status, reason: reason.into() })).into_response()
}

/// Detect and classify the monetary amounts on an uploaded bill
/// image. The image arrives as the multipart field `bill`.
///
/// A document with no recognizable amounts is a 400, not a 500; only
/// genuine processing failures surface as server errors.
pub async fn detect_amounts<R, G>(
    State(state): State<AppState<R, G>>,
    mut multipart: Multipart,
) -> Response
where
    R: TextRecognizer + 'static,
    G: TextGenerator + 'static,
{
    let mut upload: Option<Vec<u8>> = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("bill") => match field.bytes().await {
                Ok(bytes) => {
                    upload = Some(bytes.to_vec());
                    break;
                }
                Err(err) => {
                    return failure(
                        StatusCode::BAD_REQUEST,
                        "error",
                        format!("unreadable upload: {err}"),
                    )
                }
            },
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(err) => {
                return failure(
                    StatusCode::BAD_REQUEST,
                    "error",
                    format!("malformed multipart body: {err}"),
                )
            }
        }
    }
    let Some(image) = upload else {
        return failure(StatusCode::BAD_REQUEST, "no_amounts_found", "No file uploaded");
    };

    let digest = Sha256::digest(&image);
    info!(
        upload = %hex::encode(&digest[..8]),
        bytes = image.len(),
        "processing bill upload"
    );

    match state.pipeline.process_image(&image).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) if err.is_no_amounts() => {
            warn!(error = %err, "no amounts detected");
            failure(StatusCode::BAD_REQUEST, "no_amounts_found", err.to_string())
        }
        Err(err) => {
            error!(error = %err, "detection failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "error", err.to_string())
        }
    }
}
