use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use super::error::ApiError;

/// Header carrying the customer id authenticated by the upstream gateway.
pub const CUSTOMER_HEADER: &str = "x-customer-id";

/// The calling customer, `None` for anonymous requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Customer(pub Option<Uuid>);

#[async_trait]
impl<S> FromRequestParts<S> for Customer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(CUSTOMER_HEADER) else {
            return Ok(Customer(None));
        };
        let id = raw
            .to_str()
            .ok()
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .ok_or_else(|| ApiError::BadRequest(format!("{CUSTOMER_HEADER} is not a valid id")))?;
        Ok(Customer(Some(id)))
    }
}
