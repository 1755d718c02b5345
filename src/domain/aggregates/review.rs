//! Review Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::value_objects::Rating;
use crate::domain::events::{DomainEvent, ReviewEvent};

#[derive(Clone, Debug)]
pub struct Review {
    id: Uuid,
    product_id: Uuid,
    customer_id: Uuid,
    rating: Rating,
    comment: String,
    verified_purchase: bool,
    status: ReviewStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus { Pending, Approved, Rejected, Reported, Deleted }

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Reported => "reported",
            Self::Deleted => "deleted",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "reported" => Some(Self::Reported),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }

    /// Deleted reviews drop out of aggregates and duplicate checks.
    pub fn is_live(&self) -> bool { *self != Self::Deleted }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction { Approve, Reject, Report, Delete }

impl ModerationAction {
    fn as_str(&self) -> &'static str {
        match self { Self::Approve => "approve", Self::Reject => "reject", Self::Report => "report", Self::Delete => "delete" }
    }
}

/// Persisted shape of a review. `status` is `None` for legacy rows written
/// before moderation existed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: Uuid,
    pub product_id: Uuid,
    pub customer_id: Uuid,
    pub rating: Rating,
    pub comment: String,
    pub verified_purchase: bool,
    pub status: Option<ReviewStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    pub fn submit(product_id: Uuid, customer_id: Uuid, rating: Rating, comment: impl Into<String>, verified_purchase: bool, initial: ReviewStatus) -> Self {
        let id = Uuid::now_v7();
        let now = Utc::now();
        let mut review = Self {
            id, product_id, customer_id, rating, comment: comment.into(), verified_purchase,
            status: initial, created_at: now, updated_at: now, events: vec![],
        };
        review.raise_event(ReviewEvent::Submitted { review_id: id, product_id, customer_id, rating: rating.value(), verified_purchase });
        if initial == ReviewStatus::Approved {
            review.raise_event(ReviewEvent::Approved { review_id: id, product_id });
        }
        review
    }

    /// Rebuilds a review from storage, resolving a missing status to `missing_status`.
    pub fn from_record(record: ReviewRecord, missing_status: ReviewStatus) -> Self {
        Self {
            id: record.id, product_id: record.product_id, customer_id: record.customer_id,
            rating: record.rating, comment: record.comment, verified_purchase: record.verified_purchase,
            status: record.status.unwrap_or(missing_status),
            created_at: record.created_at, updated_at: record.updated_at, events: vec![],
        }
    }

    pub fn to_record(&self) -> ReviewRecord {
        ReviewRecord {
            id: self.id, product_id: self.product_id, customer_id: self.customer_id,
            rating: self.rating, comment: self.comment.clone(), verified_purchase: self.verified_purchase,
            status: Some(self.status), created_at: self.created_at, updated_at: self.updated_at,
        }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn product_id(&self) -> Uuid { self.product_id }
    pub fn customer_id(&self) -> Uuid { self.customer_id }
    pub fn rating(&self) -> Rating { self.rating }
    pub fn comment(&self) -> &str { &self.comment }
    pub fn is_verified_purchase(&self) -> bool { self.verified_purchase }
    pub fn status(&self) -> ReviewStatus { self.status }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    pub fn moderate(&mut self, action: ModerationAction) -> Result<(), ReviewError> {
        use ReviewStatus::*;
        let next = match (self.status, action) {
            (Deleted, _) => return Err(ReviewError::Deleted),
            (Pending | Reported, ModerationAction::Approve) => Approved,
            (Pending, ModerationAction::Reject) => Rejected,
            (Reported, ModerationAction::Report) => return Ok(()),
            (_, ModerationAction::Report) => Reported,
            (Reported, ModerationAction::Delete) => Deleted,
            (from, action) => return Err(ReviewError::InvalidTransition { from, action: action.as_str() }),
        };
        self.status = next;
        self.touch();
        let (review_id, product_id) = (self.id, self.product_id);
        self.raise_event(match next {
            Approved => ReviewEvent::Approved { review_id, product_id },
            Rejected => ReviewEvent::Rejected { review_id, product_id },
            Reported => ReviewEvent::Reported { review_id, product_id },
            _ => ReviewEvent::Deleted { review_id, product_id },
        });
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: ReviewEvent) { self.events.push(DomainEvent::Review(e)); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum ReviewError { Deleted, InvalidTransition { from: ReviewStatus, action: &'static str } }
impl std::error::Error for ReviewError {}
impl std::fmt::Display for ReviewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deleted => write!(f, "Review has been deleted"),
            Self::InvalidTransition { from, action } => write!(f, "Cannot {} a {} review", action, from),
        }
    }
}
