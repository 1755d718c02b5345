//! PostgreSQL [`ReviewStore`] backed by `sqlx`.
//!
//! Reads the marketplace's `orders` / `order_items` / `products` tables and
//! owns the `reviews` table (see `migrations/`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::aggregates::{Order, OrderStatus, ReviewRecord, ReviewStatus};
use crate::domain::value_objects::Rating;

use super::{ReviewFilter, ReviewStore, StoreError};

const REVIEW_COLUMNS: &str =
    "r.id, r.product_id, r.customer_id, r.rating, r.comment, r.verified_purchase, r.status, r.created_at, r.updated_at";

/// `$1` product filter, `$2` status filter. No status filter hides deleted rows.
const LIST_PREDICATE: &str = "($1::uuid IS NULL OR r.product_id = $1) \
     AND (($2::text IS NULL AND r.status IS DISTINCT FROM 'deleted') OR r.status = $2)";

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    product_id: Uuid,
    customer_id: Uuid,
    rating: i16,
    comment: String,
    verified_purchase: bool,
    status: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for ReviewRecord {
    type Error = StoreError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = u8::try_from(row.rating)
            .ok()
            .and_then(|v| Rating::new(v).ok())
            .ok_or_else(|| StoreError::Corrupt(format!("review {} has rating {}", row.id, row.rating)))?;
        let status = match row.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                ReviewStatus::parse(raw)
                    .ok_or_else(|| StoreError::Corrupt(format!("review {} has status {raw:?}", row.id)))?,
            ),
        };
        Ok(ReviewRecord {
            id: row.id,
            product_id: row.product_id,
            customer_id: row.customer_id,
            rating,
            comment: row.comment,
            verified_purchase: row.verified_purchase,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PurchaseRow {
    order_id: Uuid,
    customer_id: Uuid,
    status: String,
    product_id: Option<Uuid>,
    quantity: Option<i32>,
}

/// The `reviews_one_live_per_customer` index turns a racing second submit
/// into a unique violation.
fn duplicate_or_database(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateReview,
        _ => StoreError::Database(err),
    }
}

fn into_records(rows: Vec<ReviewRow>) -> Result<Vec<ReviewRecord>, StoreError> {
    rows.into_iter().map(ReviewRecord::try_from).collect()
}

/// Folds joined order/line rows (ordered by order id) into orders.
fn into_orders(rows: Vec<PurchaseRow>) -> Result<Vec<Order>, StoreError> {
    let mut orders: Vec<Order> = Vec::new();
    for row in rows {
        if orders.last().map(|o| o.id()) != Some(row.order_id) {
            let status = OrderStatus::parse(&row.status)
                .ok_or_else(|| StoreError::Corrupt(format!("order {} has status {:?}", row.order_id, row.status)))?;
            orders.push(Order::new(row.order_id, row.customer_id, status));
        }
        if let (Some(product_id), Some(quantity)) = (row.product_id, row.quantity) {
            if let Some(order) = orders.last_mut() {
                order.add_line(product_id, quantity.max(0) as u32);
            }
        }
    }
    Ok(orders)
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_reviews(&self, sql: &str, ids: &[Uuid]) -> Result<Vec<ReviewRecord>, StoreError> {
        let mut query = sqlx::query_as::<_, ReviewRow>(sql);
        for id in ids {
            query = query.bind(*id);
        }
        into_records(query.fetch_all(&self.pool).await?)
    }
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn insert_review(&self, review: &ReviewRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO reviews (id, product_id, customer_id, rating, comment, verified_purchase, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(review.id)
        .bind(review.product_id)
        .bind(review.customer_id)
        .bind(i16::from(review.rating.value()))
        .bind(&review.comment)
        .bind(review.verified_purchase)
        .bind(review.status.map(|s| s.as_str()))
        .bind(review.created_at)
        .bind(review.updated_at)
        .execute(&self.pool)
        .await
        .map_err(duplicate_or_database)?;
        Ok(())
    }

    async fn update_review_status(&self, id: Uuid, status: ReviewStatus, updated_at: DateTime<Utc>) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE reviews SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .bind(updated_at)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn find_review(&self, id: Uuid) -> Result<Option<ReviewRecord>, StoreError> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews r WHERE r.id = $1");
        Ok(self.fetch_reviews(&sql, &[id]).await?.into_iter().next())
    }

    async fn reviews_for_product(&self, product_id: Uuid) -> Result<Vec<ReviewRecord>, StoreError> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews r WHERE r.product_id = $1 ORDER BY r.created_at DESC");
        self.fetch_reviews(&sql, &[product_id]).await
    }

    async fn reviews_for_vendor(&self, vendor_id: Uuid) -> Result<Vec<ReviewRecord>, StoreError> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews r JOIN products p ON p.id = r.product_id \
             WHERE p.vendor_id = $1 ORDER BY r.created_at DESC"
        );
        self.fetch_reviews(&sql, &[vendor_id]).await
    }

    async fn reviews_by_customer(&self, customer_id: Uuid, product_id: Uuid) -> Result<Vec<ReviewRecord>, StoreError> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews r WHERE r.customer_id = $1 AND r.product_id = $2");
        self.fetch_reviews(&sql, &[customer_id, product_id]).await
    }

    async fn list_reviews(&self, filter: &ReviewFilter) -> Result<Vec<ReviewRecord>, StoreError> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews r WHERE {LIST_PREDICATE} \
             ORDER BY r.created_at DESC LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(filter.product_id)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(i64::from(filter.per_page))
            .bind(i64::try_from(filter.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        into_records(rows)
    }

    async fn count_reviews(&self, filter: &ReviewFilter) -> Result<u64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM reviews r WHERE {LIST_PREDICATE}");
        let total: (i64,) = sqlx::query_as(&sql)
            .bind(filter.product_id)
            .bind(filter.status.map(|s| s.as_str()))
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(total.0).unwrap_or(0))
    }

    async fn orders_for_customer(&self, customer_id: Uuid) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_as::<_, PurchaseRow>(
            "SELECT o.id AS order_id, o.customer_id, o.status, i.product_id, i.quantity \
             FROM orders o LEFT JOIN order_items i ON i.order_id = o.id \
             WHERE o.customer_id = $1 ORDER BY o.id",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        into_orders(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(rating: i16, status: Option<&str>) -> ReviewRow {
        ReviewRow {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            rating,
            comment: "fine".into(),
            verified_purchase: true,
            status: status.map(String::from),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn legacy_rows_have_no_status() {
        assert_eq!(ReviewRecord::try_from(row(5, None)).unwrap().status, None);
        assert_eq!(ReviewRecord::try_from(row(5, Some(""))).unwrap().status, None);
        assert_eq!(ReviewRecord::try_from(row(5, Some("Approved"))).unwrap().status, Some(ReviewStatus::Approved));
    }

    #[test]
    fn bad_rows_are_corrupt() {
        assert!(matches!(ReviewRecord::try_from(row(0, None)), Err(StoreError::Corrupt(_))));
        assert!(matches!(ReviewRecord::try_from(row(-3, None)), Err(StoreError::Corrupt(_))));
        assert!(matches!(ReviewRecord::try_from(row(4, Some("hidden"))), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn non_constraint_errors_stay_database_errors() {
        assert!(matches!(duplicate_or_database(sqlx::Error::RowNotFound), StoreError::Database(_)));
        assert!(matches!(duplicate_or_database(sqlx::Error::PoolTimedOut), StoreError::Database(_)));
    }

    #[test]
    fn purchase_rows_fold_into_orders() {
        let (o1, o2, c, p1, p2) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let rows = vec![
            PurchaseRow { order_id: o1, customer_id: c, status: "completed".into(), product_id: Some(p1), quantity: Some(1) },
            PurchaseRow { order_id: o1, customer_id: c, status: "completed".into(), product_id: Some(p2), quantity: Some(2) },
            PurchaseRow { order_id: o2, customer_id: c, status: "pending".into(), product_id: None, quantity: None },
        ];
        let orders = into_orders(rows).unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].lines().len(), 2);
        assert!(orders[0].is_completed_purchase(c, p2));
        assert!(orders[1].lines().is_empty());
    }
}
