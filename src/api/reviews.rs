use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::error::{ApiError, ApiResult};
use super::exports::deliver;
use super::identity::Customer;
use super::state::AppState;
use crate::domain::aggregates::{ModerationAction, ReviewStatus};
use crate::domain::services::{RatingAggregate, ReviewEligibility};
use crate::domain::value_objects::Rating;
use crate::service::ReviewView;
use crate::store::ReviewFilter;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/products/:id/reviews", get(list_product_reviews).post(submit_review))
        .route("/api/v1/products/:id/reviews/summary", get(product_summary))
        .route("/api/v1/products/:id/reviews/eligibility", get(eligibility))
        .route("/api/v1/vendors/:id/reviews/summary", get(vendor_summary))
        .route("/api/v1/reviews/:id/moderation", post(moderate))
        .route("/api/v1/admin/reviews/export", get(export_reviews))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewListParams {
    pub status: Option<String>,
    pub product_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ReviewListParams {
    fn into_filter(self, product_id: Option<Uuid>) -> ApiResult<ReviewFilter> {
        let mut filter = ReviewFilter::new(self.page, self.per_page);
        filter.product_id = product_id.or(self.product_id);
        filter.status = match self.status.as_deref() {
            None | Some("") | Some("all") => None,
            Some(raw) => Some(ReviewStatus::parse(raw).ok_or_else(|| ApiError::BadRequest(format!("unknown status {raw:?}")))?),
        };
        Ok(filter)
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewPage {
    pub data: Vec<ReviewView>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitReviewRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: u8,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct ModerationRequest {
    pub action: ModerationAction,
}

async fn list_product_reviews(
    State(s): State<AppState>,
    Path(product_id): Path<Uuid>,
    params: Result<Query<ReviewListParams>, QueryRejection>,
) -> ApiResult<Json<ReviewPage>> {
    let Query(params) = params?;
    let filter = params.into_filter(Some(product_id))?;
    let reviews = s.reviews.list(&filter).await?;
    let total = s.reviews.count(&filter).await?;
    Ok(Json(ReviewPage {
        data: reviews.iter().map(ReviewView::from).collect(),
        total,
        page: filter.page,
        per_page: filter.per_page,
    }))
}

async fn submit_review(
    State(s): State<AppState>,
    Path(product_id): Path<Uuid>,
    Customer(customer): Customer,
    payload: Result<Json<SubmitReviewRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ReviewView>)> {
    let Json(r) = payload?;
    r.validate()?;
    let rating = Rating::new(r.rating).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let review = s.reviews.submit(customer, product_id, rating, &r.comment).await?;
    Ok((StatusCode::CREATED, Json(ReviewView::from(&review))))
}

async fn product_summary(State(s): State<AppState>, Path(product_id): Path<Uuid>) -> ApiResult<Json<RatingAggregate>> {
    Ok(Json(s.reviews.product_summary(product_id).await?))
}

async fn vendor_summary(State(s): State<AppState>, Path(vendor_id): Path<Uuid>) -> ApiResult<Json<RatingAggregate>> {
    Ok(Json(s.reviews.vendor_summary(vendor_id).await?))
}

async fn eligibility(
    State(s): State<AppState>,
    Path(product_id): Path<Uuid>,
    Customer(customer): Customer,
) -> ApiResult<Json<ReviewEligibility>> {
    Ok(Json(s.reviews.eligibility(customer, product_id).await?))
}

async fn moderate(
    State(s): State<AppState>,
    Path(review_id): Path<Uuid>,
    payload: Result<Json<ModerationRequest>, JsonRejection>,
) -> ApiResult<Json<ReviewView>> {
    let Json(r) = payload?;
    let review = s.reviews.moderate(review_id, r.action).await?;
    Ok(Json(ReviewView::from(&review)))
}

async fn export_reviews(
    State(s): State<AppState>,
    params: Result<Query<ReviewListParams>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(params) = params?;
    let mut filter = params.into_filter(None)?;
    filter.page = 1;
    filter.per_page = u32::MAX;
    let records = s.reviews.export_records(&filter).await?;
    let export = s.review_exporter.export_today(&records, "reviews")?;
    Ok(deliver(&s, export).await)
}
