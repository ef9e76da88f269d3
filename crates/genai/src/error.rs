use thiserror::Error;

use crate::repair::RepairError;

#[derive(Debug, Error)]
pub enum GenAiError {
    #[error("request to text-generation backend failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("empty response from text-generation backend")]
    EmptyResponse,
    #[error("content blocked by safety filters")]
    SafetyBlocked,
    #[error("response exceeded the output token limit")]
    TokenLimit,
    #[error("malformed backend response: {0}")]
    Malformed(#[from] RepairError),
    #[error("backend unavailable after {attempts} attempts, last error: {last}")]
    Exhausted { attempts: u32, last: String },
}
