pub mod affiliation;
pub mod scoring;
pub mod weights;

pub use affiliation::{is_corporate_affiliated, is_independent_builder, matches_region};
pub use scoring::{ScoreEngine, ScoreSet, ScoringConfig};
pub use weights::{Weights, CANONICAL_WEIGHTS};
