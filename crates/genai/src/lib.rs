pub mod error;
pub mod gemini;
pub mod generator;
pub mod repair;
pub mod retry;

pub use error::GenAiError;
pub use gemini::GeminiClient;
pub use generator::{MockGenerator, TextGenerator};
pub use repair::{parse_lenient, RepairError};
pub use retry::RetryPolicy;

use serde_json::Value;

/// Submit a prompt and parse the reply as JSON, retrying the whole
/// call (request *and* parse) on failure. A reply that only parses
/// after repair is fine; a reply that survives no repair counts as a
/// failed attempt like any transport error.
pub async fn request_json<G: TextGenerator + ?Sized>(
    generator: &G,
    policy: &RetryPolicy,
    prompt: &str,
) -> Result<Value, GenAiError> {
    policy
        .run(|| async {
            let text = generator.generate(prompt).await?;
            parse_lenient(&text).map_err(GenAiError::from)
        })
        .await
}
