//! Amount extraction pipeline for photographed and scanned bills.
//!
//! Six stages run strictly in sequence: token extraction, amount
//! cleaning, aggregation/dedup, term detection, classification (model
//! backed with a rule fallback), and provenance location. Each stage
//! owns its output; the two external backends are injected behind
//! traits so the whole pipeline runs deterministically under test.

pub mod aggregate;
pub mod classify;
pub mod clean;
pub mod error;
pub mod pipeline;
pub mod provenance;
pub mod terms;
pub mod tokens;

pub use aggregate::Aggregator;
pub use classify::Classification;
pub use error::{ExtractError, PipelineError};
pub use pipeline::{BillPipeline, DetectionReport};
pub use terms::{DetectedTerms, Term};
pub use tokens::TokenExtraction;
