//! Environment-driven configuration.

use anyhow::{Context, Result};
use tally_core::CandidatePolicy;

pub struct ServerConfig {
    pub addr: String,
    pub gemini_api_key: String,
    pub vision_api_key: String,
    pub policy: CandidatePolicy,
}

impl ServerConfig {
    /// Read configuration from the environment. `TALLY_POLICY` may
    /// point at a TOML file overriding the default aggregation policy.
    pub fn from_env() -> Result<Self> {
        let addr = std::env::var("TALLY_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let gemini_api_key =
            std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY is not set")?;
        let vision_api_key =
            std::env::var("VISION_API_KEY").context("VISION_API_KEY is not set")?;

        let policy = match std::env::var("TALLY_POLICY") {
            Ok(path) => {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read policy file {path}"))?;
                CandidatePolicy::from_toml(&content)
                    .with_context(|| format!("invalid policy file {path}"))?
            }
            Err(_) => CandidatePolicy::default(),
        };

        Ok(Self { addr, gemini_api_key, vision_api_key, policy })
    }
}
