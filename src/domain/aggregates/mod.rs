//! Aggregates module
pub mod review;
pub mod order;

pub use review::{ModerationAction, Review, ReviewError, ReviewRecord, ReviewStatus};
pub use order::{Order, OrderLine, OrderStatus};
