//! In-memory [`ReviewStore`] for local runs and tests.
//!
//! Data lives behind a `tokio::sync::RwLock`; nothing survives a restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::aggregates::{Order, OrderStatus, ReviewRecord, ReviewStatus};

use super::{ReviewFilter, ReviewStore, StoreError};

#[derive(Default)]
struct Inner {
    reviews: Vec<ReviewRecord>,
    orders: Vec<Order>,
    product_vendors: HashMap<Uuid, Uuid>,
}

#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_order(&self, order: Order) {
        self.inner.write().await.orders.push(order);
    }

    pub async fn set_order_status(&self, order_id: Uuid, status: OrderStatus) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let order = inner.orders.iter_mut().find(|o| o.id() == order_id).ok_or(StoreError::NotFound)?;
        order.set_status(status);
        Ok(())
    }

    pub async fn assign_vendor(&self, product_id: Uuid, vendor_id: Uuid) {
        self.inner.write().await.product_vendors.insert(product_id, vendor_id);
    }

    async fn select<F>(&self, predicate: F) -> Vec<ReviewRecord>
    where
        F: Fn(&Inner, &ReviewRecord) -> bool,
    {
        let inner = self.inner.read().await;
        inner.reviews.iter().filter(|r| predicate(&inner, r)).cloned().collect()
    }
}

fn listed(filter: &ReviewFilter, review: &ReviewRecord) -> bool {
    filter.product_id.map_or(true, |p| review.product_id == p) && filter.admits(review.status)
}

#[async_trait]
impl ReviewStore for InMemoryStore {
    async fn insert_review(&self, review: &ReviewRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let duplicate = inner.reviews.iter().any(|r| {
            r.customer_id == review.customer_id
                && r.product_id == review.product_id
                && r.status != Some(ReviewStatus::Deleted)
        });
        if duplicate {
            return Err(StoreError::DuplicateReview);
        }
        inner.reviews.push(review.clone());
        Ok(())
    }

    async fn update_review_status(&self, id: Uuid, status: ReviewStatus, updated_at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let review = inner.reviews.iter_mut().find(|r| r.id == id).ok_or(StoreError::NotFound)?;
        review.status = Some(status);
        review.updated_at = updated_at;
        Ok(())
    }

    async fn find_review(&self, id: Uuid) -> Result<Option<ReviewRecord>, StoreError> {
        Ok(self.inner.read().await.reviews.iter().find(|r| r.id == id).cloned())
    }

    async fn reviews_for_product(&self, product_id: Uuid) -> Result<Vec<ReviewRecord>, StoreError> {
        Ok(self.select(|_, r| r.product_id == product_id).await)
    }

    async fn reviews_for_vendor(&self, vendor_id: Uuid) -> Result<Vec<ReviewRecord>, StoreError> {
        Ok(self.select(|inner, r| inner.product_vendors.get(&r.product_id) == Some(&vendor_id)).await)
    }

    async fn reviews_by_customer(&self, customer_id: Uuid, product_id: Uuid) -> Result<Vec<ReviewRecord>, StoreError> {
        Ok(self.select(|_, r| r.customer_id == customer_id && r.product_id == product_id).await)
    }

    async fn list_reviews(&self, filter: &ReviewFilter) -> Result<Vec<ReviewRecord>, StoreError> {
        let mut matching = self.select(|_, r| listed(filter, r)).await;
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let skip = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
        Ok(matching.into_iter().skip(skip).take(filter.per_page as usize).collect())
    }

    async fn count_reviews(&self, filter: &ReviewFilter) -> Result<u64, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.reviews.iter().filter(|r| listed(filter, r)).count() as u64)
    }

    async fn orders_for_customer(&self, customer_id: Uuid) -> Result<Vec<Order>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.orders.iter().filter(|o| o.customer_id() == customer_id).cloned().collect())
    }
}
