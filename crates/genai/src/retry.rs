use std::future::Future;
use std::time::Duration;

use crate::error::GenAiError;

/// Bounded retry with linearly increasing backoff: the delay after
/// attempt `n` is `base_delay * n`. Kept separate from the call it
/// wraps so the schedule is testable on its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts, base_delay }
    }

    /// The sleep inserted after each failed attempt (one fewer than
    /// the number of attempts).
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..self.max_attempts).map(|attempt| self.base_delay * attempt)
    }

    /// Run `op` until it succeeds or the attempt budget is spent.
    /// The final error wraps the last failure.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, GenAiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GenAiError>>,
    {
        let mut last: Option<GenAiError> = None;

        for attempt in 1..=self.max_attempts.max(1) {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    tracing::warn!(attempt, error = %err, "text-generation attempt failed");
                    last = Some(err);
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.base_delay * attempt).await;
                    }
                }
            }
        }

        Err(GenAiError::Exhausted {
            attempts: self.max_attempts.max(1),
            last: last.map(|e| e.to_string()).unwrap_or_default(),
        })
    }
}
