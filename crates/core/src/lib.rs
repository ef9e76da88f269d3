pub mod amount;
pub mod currency;
pub mod policy;

pub use amount::{AmountKind, ClassifiedAmount, FinalAmount};
pub use currency::Currency;
pub use policy::{Band, CandidatePolicy, PolicyError};
