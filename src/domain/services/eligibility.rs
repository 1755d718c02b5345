//! Review eligibility and verified-purchase gating.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::{Order, Review, ReviewStatus};

/// Platform policy for who may review and how new reviews start out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReviewPolicy {
    /// Only customers with a completed purchase may review.
    pub require_purchase: bool,
    /// New reviews skip the moderation queue.
    pub auto_approve: bool,
    /// Status assumed for stored reviews that carry none.
    pub missing_status: ReviewStatus,
}

impl ReviewPolicy {
    pub fn initial_status(&self) -> ReviewStatus {
        if self.auto_approve { ReviewStatus::Approved } else { ReviewStatus::Pending }
    }
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self { require_purchase: false, auto_approve: false, missing_status: ReviewStatus::Approved }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IneligibilityReason { Unauthenticated, AlreadyReviewed, NoCompletedPurchase }

impl std::fmt::Display for IneligibilityReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Unauthenticated => "authentication required",
            Self::AlreadyReviewed => "already reviewed",
            Self::NoCompletedPurchase => "no completed purchase found",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEligibility {
    pub can_review: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub is_verified_purchase: bool,
}

impl ReviewEligibility {
    fn allowed(is_verified_purchase: bool) -> Self {
        Self { can_review: true, reason: None, is_verified_purchase }
    }

    fn denied(reason: IneligibilityReason, is_verified_purchase: bool) -> Self {
        Self { can_review: false, reason: Some(reason.to_string()), is_verified_purchase }
    }
}

/// Outcome of the eligibility rules, keeping the typed reason for callers
/// that need to branch on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
    pub reason: Option<IneligibilityReason>,
    pub is_verified_purchase: bool,
}

impl Decision {
    pub fn can_review(&self) -> bool { self.reason.is_none() }
}

impl From<Decision> for ReviewEligibility {
    fn from(d: Decision) -> Self {
        match d.reason {
            None => ReviewEligibility::allowed(d.is_verified_purchase),
            Some(reason) => ReviewEligibility::denied(reason, d.is_verified_purchase),
        }
    }
}

/// Decides whether `customer` may review `product_id`.
///
/// `existing` is the customer's reviews and `orders` their order history;
/// entries belonging to other customers or products are ignored.
pub fn evaluate(customer: Option<Uuid>, product_id: Uuid, existing: &[Review], orders: &[Order], policy: &ReviewPolicy) -> Decision {
    let Some(customer_id) = customer else {
        return Decision { reason: Some(IneligibilityReason::Unauthenticated), is_verified_purchase: false };
    };
    let is_verified_purchase = orders.iter().any(|o| o.is_completed_purchase(customer_id, product_id));
    let already_reviewed = existing
        .iter()
        .any(|r| r.customer_id() == customer_id && r.product_id() == product_id && r.status().is_live());

    let reason = if already_reviewed {
        Some(IneligibilityReason::AlreadyReviewed)
    } else if policy.require_purchase && !is_verified_purchase {
        Some(IneligibilityReason::NoCompletedPurchase)
    } else {
        None
    };
    Decision { reason, is_verified_purchase }
}
