//! Rating aggregation over a set of reviews.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::aggregates::Review;
use crate::domain::value_objects::Rating;

/// Summary shown on product pages and seller dashboards.
///
/// `ratingBreakdown` always carries all five star keys, and its counts sum
/// to `totalReviews`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingAggregate {
    pub avg_rating: f64,
    pub total_reviews: u64,
    pub rating_breakdown: BTreeMap<u8, u64>,
    pub verified_purchases: u64,
}

impl RatingAggregate {
    pub fn empty() -> Self {
        Self {
            avg_rating: 0.0,
            total_reviews: 0,
            rating_breakdown: Rating::all().map(|r| (r.value(), 0)).collect(),
            verified_purchases: 0,
        }
    }

    /// Aggregates every review that has not been deleted.
    pub fn from_reviews<'a, I>(reviews: I) -> Self
    where
        I: IntoIterator<Item = &'a Review>,
    {
        let mut aggregate = Self::empty();
        let mut sum: u64 = 0;
        for review in reviews.into_iter().filter(|r| r.status().is_live()) {
            let stars = review.rating().value();
            *aggregate.rating_breakdown.entry(stars).or_insert(0) += 1;
            aggregate.total_reviews += 1;
            sum += u64::from(stars);
            if review.is_verified_purchase() {
                aggregate.verified_purchases += 1;
            }
        }
        if aggregate.total_reviews > 0 {
            aggregate.avg_rating = round_one_decimal(sum as f64 / aggregate.total_reviews as f64);
        }
        aggregate
    }

    pub fn count_for(&self, rating: Rating) -> u64 {
        self.rating_breakdown.get(&rating.value()).copied().unwrap_or(0)
    }
}

impl Default for RatingAggregate {
    fn default() -> Self {
        Self::empty()
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
