//! Google Cloud Vision REST backend for the `TextRecognizer` trait.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::recognizer::{RecognizeError, RecognizedText, TextRecognizer};

const ANNOTATE_URL: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Vision confidence assumed when the API omits one.
const FALLBACK_CONFIDENCE: f32 = 0.5;

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<ImageRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
    image_context: ImageContext,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageContext {
    language_hints: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    description: String,
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// HTTP client for Google Cloud Vision text detection.
#[derive(Debug, Clone)]
pub struct GoogleVisionRecognizer {
    client: Client,
    api_key: String,
}

impl GoogleVisionRecognizer {
    pub fn new(api_key: String) -> Self {
        Self { client: Client::new(), api_key }
    }
}

#[async_trait]
impl TextRecognizer for GoogleVisionRecognizer {
    async fn recognize(
        &self,
        image_bytes: &[u8],
    ) -> Result<Option<RecognizedText>, RecognizeError> {
        let content = base64::engine::general_purpose::STANDARD.encode(image_bytes);
        let request = AnnotateRequest {
            requests: vec![ImageRequest {
                image: ImageContent { content },
                features: vec![Feature { kind: "TEXT_DETECTION" }],
                image_context: ImageContext { language_hints: vec!["en"] },
            }],
        };

        let response: AnnotateResponse = self
            .client
            .post(ANNOTATE_URL)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(image_response) = response.responses.into_iter().next() else {
            return Ok(None);
        };
        if let Some(err) = image_response.error {
            return Err(RecognizeError::Backend(err.message));
        }

        // The first annotation carries the full recognized text; the
        // rest are per-word boxes we do not use.
        Ok(image_response.text_annotations.into_iter().next().map(|a| {
            RecognizedText {
                text: a.description,
                confidence: a.confidence.unwrap_or(FALLBACK_CONFIDENCE),
            }
        }))
    }
}
