//! Review use cases: aggregates, eligibility, submission, moderation and export.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{ModerationAction, Review, ReviewRecord};
use crate::domain::services::{self, RatingAggregate, ReviewEligibility, ReviewPolicy};
use crate::domain::value_objects::Rating;
use crate::export::{format, ExportableRecord, FormatterRegistry, TabularExporter};
use crate::messaging::EventPublisher;
use crate::store::{ReviewFilter, ReviewStore, StoreError};
use crate::{MarketplaceError, Result};

/// Review as it appears in admin listings and CSV exports. `_id` stays out
/// of the CSV columns.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub product_id: Uuid,
    pub customer_id: Uuid,
    pub rating: Rating,
    pub comment: String,
    pub verified_purchase: bool,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Review> for ReviewView {
    fn from(r: &Review) -> Self {
        Self {
            id: r.id(),
            product_id: r.product_id(),
            customer_id: r.customer_id(),
            rating: r.rating(),
            comment: r.comment().to_string(),
            verified_purchase: r.is_verified_purchase(),
            status: r.status().to_string(),
            created_at: r.created_at(),
        }
    }
}

pub struct ReviewService {
    store: Arc<dyn ReviewStore>,
    policy: ReviewPolicy,
    publisher: EventPublisher,
}

impl ReviewService {
    pub fn new(store: Arc<dyn ReviewStore>, policy: ReviewPolicy, publisher: EventPublisher) -> Self {
        Self { store, policy, publisher }
    }

    fn hydrate(&self, records: Vec<ReviewRecord>) -> Vec<Review> {
        records.into_iter().map(|r| Review::from_record(r, self.policy.missing_status)).collect()
    }

    pub async fn product_summary(&self, product_id: Uuid) -> Result<RatingAggregate> {
        let reviews = self.hydrate(self.store.reviews_for_product(product_id).await?);
        Ok(RatingAggregate::from_reviews(&reviews))
    }

    pub async fn vendor_summary(&self, vendor_id: Uuid) -> Result<RatingAggregate> {
        let reviews = self.hydrate(self.store.reviews_for_vendor(vendor_id).await?);
        Ok(RatingAggregate::from_reviews(&reviews))
    }

    async fn decide(&self, customer: Option<Uuid>, product_id: Uuid) -> Result<services::Decision> {
        let Some(customer_id) = customer else {
            return Ok(services::evaluate(None, product_id, &[], &[], &self.policy));
        };
        let existing = self.hydrate(self.store.reviews_by_customer(customer_id, product_id).await?);
        let orders = self.store.orders_for_customer(customer_id).await?;
        Ok(services::evaluate(Some(customer_id), product_id, &existing, &orders, &self.policy))
    }

    pub async fn eligibility(&self, customer: Option<Uuid>, product_id: Uuid) -> Result<ReviewEligibility> {
        Ok(self.decide(customer, product_id).await?.into())
    }

    /// Stores a new review after re-checking eligibility. The verified flag
    /// is fixed here and never recomputed.
    pub async fn submit(&self, customer: Option<Uuid>, product_id: Uuid, rating: Rating, comment: &str) -> Result<Review> {
        let decision = self.decide(customer, product_id).await?;
        if let Some(reason) = decision.reason {
            return Err(MarketplaceError::Ineligible(reason));
        }
        let customer_id = customer.ok_or(MarketplaceError::Ineligible(services::IneligibilityReason::Unauthenticated))?;
        let mut review = Review::submit(
            product_id,
            customer_id,
            rating,
            comment.trim(),
            decision.is_verified_purchase,
            self.policy.initial_status(),
        );
        self.store.insert_review(&review.to_record()).await.map_err(|e| match e {
            StoreError::DuplicateReview => MarketplaceError::Ineligible(services::IneligibilityReason::AlreadyReviewed),
            other => other.into(),
        })?;
        tracing::info!(review_id = %review.id(), %product_id, verified = review.is_verified_purchase(), status = %review.status(), "review submitted");
        self.publisher.publish_all(review.take_events()).await;
        Ok(review)
    }

    pub async fn moderate(&self, review_id: Uuid, action: ModerationAction) -> Result<Review> {
        let record = self.store.find_review(review_id).await?.ok_or(MarketplaceError::ReviewNotFound)?;
        let mut review = Review::from_record(record, self.policy.missing_status);
        let before = review.status();
        review.moderate(action)?;
        if review.status() != before {
            self.store.update_review_status(review.id(), review.status(), review.updated_at()).await?;
            tracing::info!(%review_id, from = %before, to = %review.status(), "review moderated");
        }
        self.publisher.publish_all(review.take_events()).await;
        Ok(review)
    }

    pub async fn list(&self, filter: &ReviewFilter) -> Result<Vec<Review>> {
        Ok(self.hydrate(self.store.list_reviews(filter).await?))
    }

    pub async fn count(&self, filter: &ReviewFilter) -> Result<u64> {
        Ok(self.store.count_reviews(filter).await?)
    }

    pub async fn export_records(&self, filter: &ReviewFilter) -> Result<Vec<ExportableRecord>> {
        let reviews = self.list(filter).await?;
        reviews
            .iter()
            .map(|r| match serde_json::to_value(ReviewView::from(r)) {
                Ok(serde_json::Value::Object(map)) => Ok(map),
                Ok(_) => Err(MarketplaceError::Internal("review did not serialize to an object".to_string())),
                Err(e) => Err(MarketplaceError::Internal(e.to_string())),
            })
            .collect()
    }
}

/// Exporter used for the admin review download.
pub fn review_exporter() -> TabularExporter {
    TabularExporter::with_formatters(
        FormatterRegistry::new()
            .register("verifiedPurchase", format::yes_no)
            .register("createdAt", format::date_only),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{Order, OrderStatus, ReviewStatus};
    use crate::domain::services::IneligibilityReason;
    use crate::store::memory::InMemoryStore;

    fn service(store: Arc<InMemoryStore>, policy: ReviewPolicy) -> ReviewService {
        ReviewService::new(store, policy, EventPublisher::disabled())
    }

    fn stars(n: u8) -> Rating {
        Rating::new(n).unwrap()
    }

    #[tokio::test]
    async fn verified_flag_is_fixed_at_submission() {
        let store = Arc::new(InMemoryStore::new());
        let (customer, product, order_id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        store.add_order(Order::new(order_id, customer, OrderStatus::Delivered).with_line(product, 1)).await;
        let svc = service(store.clone(), ReviewPolicy::default());

        let review = svc.submit(Some(customer), product, stars(5), "  Great kettle  ").await.unwrap();
        assert!(review.is_verified_purchase());
        assert_eq!(review.comment(), "Great kettle");
        assert_eq!(review.status(), ReviewStatus::Pending);

        store.set_order_status(order_id, OrderStatus::Refunded).await.unwrap();
        let eligibility = svc.eligibility(Some(customer), product).await.unwrap();
        assert!(!eligibility.is_verified_purchase);
        assert_eq!(eligibility.reason.as_deref(), Some("already reviewed"));

        svc.moderate(review.id(), ModerationAction::Approve).await.unwrap();
        let stored = store.find_review(review.id()).await.unwrap().unwrap();
        assert!(stored.verified_purchase);
        assert_eq!(svc.product_summary(product).await.unwrap().verified_purchases, 1);
    }

    #[tokio::test]
    async fn duplicate_and_gated_submissions_are_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let policy = ReviewPolicy { require_purchase: true, auto_approve: true, ..ReviewPolicy::default() };
        let svc = service(store.clone(), policy);
        let (customer, product) = (Uuid::new_v4(), Uuid::new_v4());

        let err = svc.submit(Some(customer), product, stars(4), "").await.unwrap_err();
        assert!(matches!(err, MarketplaceError::Ineligible(IneligibilityReason::NoCompletedPurchase)));
        let err = svc.submit(None, product, stars(4), "").await.unwrap_err();
        assert!(matches!(err, MarketplaceError::Ineligible(IneligibilityReason::Unauthenticated)));

        store.add_order(Order::new(Uuid::new_v4(), customer, OrderStatus::Delivered).with_line(product, 1)).await;
        let review = svc.submit(Some(customer), product, stars(4), "").await.unwrap();
        assert_eq!(review.status(), ReviewStatus::Approved);
        let err = svc.submit(Some(customer), product, stars(2), "again").await.unwrap_err();
        assert!(matches!(err, MarketplaceError::Ineligible(IneligibilityReason::AlreadyReviewed)));
    }

    #[tokio::test]
    async fn deleting_removes_review_from_summary() {
        let store = Arc::new(InMemoryStore::new());
        let svc = service(store, ReviewPolicy::default());
        let product = Uuid::new_v4();
        let keep = svc.submit(Some(Uuid::new_v4()), product, stars(5), "").await.unwrap();
        let spam = svc.submit(Some(Uuid::new_v4()), product, stars(1), "spam").await.unwrap();
        svc.moderate(keep.id(), ModerationAction::Approve).await.unwrap();
        svc.moderate(spam.id(), ModerationAction::Report).await.unwrap();
        assert_eq!(svc.product_summary(product).await.unwrap().avg_rating, 3.0);

        svc.moderate(spam.id(), ModerationAction::Delete).await.unwrap();
        let summary = svc.product_summary(product).await.unwrap();
        assert_eq!(summary.total_reviews, 1);
        assert_eq!(summary.avg_rating, 5.0);
        assert!(matches!(
            svc.moderate(spam.id(), ModerationAction::Approve).await,
            Err(MarketplaceError::Review(_))
        ));
        assert!(matches!(
            svc.moderate(Uuid::new_v4(), ModerationAction::Approve).await,
            Err(MarketplaceError::ReviewNotFound)
        ));
    }

    #[tokio::test]
    async fn deleted_reviews_leave_the_product_listing() {
        let store = Arc::new(InMemoryStore::new());
        let svc = service(store, ReviewPolicy::default());
        let product = Uuid::new_v4();
        let gone = svc.submit(Some(Uuid::new_v4()), product, stars(1), "spam").await.unwrap();
        svc.moderate(gone.id(), ModerationAction::Report).await.unwrap();
        svc.moderate(gone.id(), ModerationAction::Delete).await.unwrap();
        svc.submit(Some(Uuid::new_v4()), product, stars(4), "").await.unwrap();

        let mut filter = ReviewFilter::new(None, None);
        filter.product_id = Some(product);
        let listed = svc.list(&filter).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed.iter().all(|r| r.status() != ReviewStatus::Deleted));
        assert_eq!(svc.count(&filter).await.unwrap(), 1);

        filter.status = Some(ReviewStatus::Deleted);
        assert_eq!(svc.list(&filter).await.unwrap()[0].id(), gone.id());
    }

    #[tokio::test]
    async fn concurrent_submits_store_one_review() {
        let store = Arc::new(InMemoryStore::new());
        let svc = Arc::new(service(store.clone(), ReviewPolicy::default()));
        let (customer, product) = (Uuid::new_v4(), Uuid::new_v4());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.submit(Some(customer), product, stars(5), "").await })
            })
            .collect();
        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(err) => {
                    assert!(matches!(err, MarketplaceError::Ineligible(IneligibilityReason::AlreadyReviewed)))
                }
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(store.reviews_by_customer(customer, product).await.unwrap().len(), 1);
    }

    /// Store whose duplicate pre-check sees nothing, as when two requests
    /// race past the read before either insert lands.
    struct StaleReads(InMemoryStore);

    #[async_trait::async_trait]
    impl ReviewStore for StaleReads {
        async fn insert_review(&self, review: &ReviewRecord) -> std::result::Result<(), StoreError> {
            self.0.insert_review(review).await
        }
        async fn update_review_status(
            &self,
            id: Uuid,
            status: ReviewStatus,
            updated_at: chrono::DateTime<chrono::Utc>,
        ) -> std::result::Result<(), StoreError> {
            self.0.update_review_status(id, status, updated_at).await
        }
        async fn find_review(&self, id: Uuid) -> std::result::Result<Option<ReviewRecord>, StoreError> {
            self.0.find_review(id).await
        }
        async fn reviews_for_product(&self, product_id: Uuid) -> std::result::Result<Vec<ReviewRecord>, StoreError> {
            self.0.reviews_for_product(product_id).await
        }
        async fn reviews_for_vendor(&self, vendor_id: Uuid) -> std::result::Result<Vec<ReviewRecord>, StoreError> {
            self.0.reviews_for_vendor(vendor_id).await
        }
        async fn reviews_by_customer(&self, _: Uuid, _: Uuid) -> std::result::Result<Vec<ReviewRecord>, StoreError> {
            Ok(Vec::new())
        }
        async fn list_reviews(&self, filter: &ReviewFilter) -> std::result::Result<Vec<ReviewRecord>, StoreError> {
            self.0.list_reviews(filter).await
        }
        async fn count_reviews(&self, filter: &ReviewFilter) -> std::result::Result<u64, StoreError> {
            self.0.count_reviews(filter).await
        }
        async fn orders_for_customer(&self, customer_id: Uuid) -> std::result::Result<Vec<Order>, StoreError> {
            self.0.orders_for_customer(customer_id).await
        }
    }

    #[tokio::test]
    async fn storage_duplicate_reads_as_already_reviewed() {
        let svc = ReviewService::new(
            Arc::new(StaleReads(InMemoryStore::new())),
            ReviewPolicy::default(),
            EventPublisher::disabled(),
        );
        let (customer, product) = (Uuid::new_v4(), Uuid::new_v4());
        svc.submit(Some(customer), product, stars(3), "").await.unwrap();
        let err = svc.submit(Some(customer), product, stars(4), "").await.unwrap_err();
        assert!(matches!(err, MarketplaceError::Ineligible(IneligibilityReason::AlreadyReviewed)));
        assert_eq!(svc.product_summary(product).await.unwrap().total_reviews, 1);
    }

    #[tokio::test]
    async fn vendor_summary_spans_products() {
        let store = Arc::new(InMemoryStore::new());
        let (vendor, p1, p2) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        store.assign_vendor(p1, vendor).await;
        store.assign_vendor(p2, vendor).await;
        let svc = service(store, ReviewPolicy::default());
        svc.submit(Some(Uuid::new_v4()), p1, stars(4), "").await.unwrap();
        svc.submit(Some(Uuid::new_v4()), p2, stars(2), "").await.unwrap();
        svc.submit(Some(Uuid::new_v4()), Uuid::new_v4(), stars(5), "").await.unwrap();
        let summary = svc.vendor_summary(vendor).await.unwrap();
        assert_eq!(summary.total_reviews, 2);
        assert_eq!(summary.avg_rating, 3.0);
    }

    #[tokio::test]
    async fn review_export_hides_internal_id() {
        let store = Arc::new(InMemoryStore::new());
        let svc = service(store, ReviewPolicy::default());
        let product = Uuid::new_v4();
        svc.submit(Some(Uuid::new_v4()), product, stars(3), "said \"meh\"").await.unwrap();

        let mut filter = ReviewFilter::new(None, None);
        filter.product_id = Some(product);
        let records = svc.export_records(&filter).await.unwrap();
        let date = chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let export = review_exporter().export(&records, "reviews", date).unwrap();
        let mut lines = export.body.lines();
        assert_eq!(
            lines.next(),
            Some("\"productId\",\"customerId\",\"rating\",\"comment\",\"verifiedPurchase\",\"status\",\"createdAt\"")
        );
        let row = lines.next().unwrap();
        assert!(row.contains("\"3\",\"said \"\"meh\"\"\",\"No\",\"pending\""));
        assert_eq!(export.filename, "reviews_2025-06-01.csv");
    }
}
