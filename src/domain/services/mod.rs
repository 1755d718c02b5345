//! Domain services
pub mod aggregation;
pub mod eligibility;

pub use aggregation::RatingAggregate;
pub use eligibility::{evaluate, Decision, IneligibilityReason, ReviewEligibility, ReviewPolicy};
