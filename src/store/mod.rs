//! Storage abstraction for reviews and purchase history.
//!
//! [`ReviewStore`] is implemented by [`postgres::PgStore`] for production
//! and [`memory::InMemoryStore`] for local runs and tests. Implementations
//! must be `Send + Sync` to be shared across axum handlers.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{Order, ReviewRecord, ReviewStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("customer already has a live review for this product")]
    DuplicateReview,
    #[error("corrupt row: {0}")]
    Corrupt(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Admin listing filter. `page` is 1-based.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewFilter {
    pub product_id: Option<Uuid>,
    pub status: Option<ReviewStatus>,
    pub page: u32,
    pub per_page: u32,
}

impl ReviewFilter {
    pub const DEFAULT_PER_PAGE: u32 = 20;
    pub const MAX_PER_PAGE: u32 = 100;

    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(Self::DEFAULT_PER_PAGE).clamp(1, Self::MAX_PER_PAGE),
            ..Self::default()
        }
    }

    /// Rows to skip. Computed in `u64` so any `page` from a query string is safe.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1).saturating_mul(u64::from(self.per_page))
    }

    /// Whether `status` passes the status filter. Without an explicit filter
    /// deleted reviews are left out.
    pub fn admits(&self, status: Option<ReviewStatus>) -> bool {
        match self.status {
            Some(wanted) => status == Some(wanted),
            None => status != Some(ReviewStatus::Deleted),
        }
    }
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Fails with [`StoreError::DuplicateReview`] when the customer already
    /// has a non-deleted review for the product.
    async fn insert_review(&self, review: &ReviewRecord) -> Result<(), StoreError>;

    /// Only the status and `updated_at` of a stored review ever change.
    async fn update_review_status(&self, id: Uuid, status: ReviewStatus, updated_at: DateTime<Utc>) -> Result<(), StoreError>;

    async fn find_review(&self, id: Uuid) -> Result<Option<ReviewRecord>, StoreError>;

    async fn reviews_for_product(&self, product_id: Uuid) -> Result<Vec<ReviewRecord>, StoreError>;

    async fn reviews_for_vendor(&self, vendor_id: Uuid) -> Result<Vec<ReviewRecord>, StoreError>;

    async fn reviews_by_customer(&self, customer_id: Uuid, product_id: Uuid) -> Result<Vec<ReviewRecord>, StoreError>;

    /// Newest first, paged by `filter`. A `status` filter of `None` includes
    /// every status except `deleted`.
    async fn list_reviews(&self, filter: &ReviewFilter) -> Result<Vec<ReviewRecord>, StoreError>;

    /// Number of reviews matching `filter`, ignoring paging.
    async fn count_reviews(&self, filter: &ReviewFilter) -> Result<u64, StoreError>;

    async fn orders_for_customer(&self, customer_id: Uuid) -> Result<Vec<Order>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_paging_is_clamped() {
        let f = ReviewFilter::new(Some(0), Some(1000));
        assert_eq!((f.page, f.per_page, f.offset()), (1, 100, 0));
        let f = ReviewFilter::new(Some(3), None);
        assert_eq!(f.offset(), 40);
    }

    #[test]
    fn huge_page_offset_does_not_overflow() {
        let f = ReviewFilter::new(Some(u32::MAX), Some(100));
        assert_eq!(f.offset(), u64::from(u32::MAX - 1) * 100);
        let mut f = ReviewFilter::new(Some(u32::MAX), None);
        f.per_page = u32::MAX;
        assert_eq!(f.offset(), u64::from(u32::MAX - 1) * u64::from(u32::MAX));
    }

    #[test]
    fn unfiltered_listing_hides_deleted() {
        let mut f = ReviewFilter::new(None, None);
        assert!(f.admits(Some(ReviewStatus::Reported)));
        assert!(f.admits(None));
        assert!(!f.admits(Some(ReviewStatus::Deleted)));
        f.status = Some(ReviewStatus::Deleted);
        assert!(f.admits(Some(ReviewStatus::Deleted)));
        assert!(!f.admits(Some(ReviewStatus::Approved)));
    }
}
