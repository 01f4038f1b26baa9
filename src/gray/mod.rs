//! Gray release: rollout rules and deterministic client routing

pub mod evaluator;
pub mod registry;
pub mod rule;

pub use evaluator::{bucket, resolve, Resolved, ServedVersion};
pub use registry::GrayRuleRegistry;
pub use rule::{validate_percentage, GrayRule};
