//! OpenSASE Marketplace Insights
//!
//! Review and reporting backend shared by the admin console, the seller
//! dashboard and the storefront.
//!
//! ## Features
//! - Rating aggregates per product and per vendor
//! - Review eligibility with verified-purchase gating
//! - Review moderation workflow
//! - CSV export of arbitrary tabular records

pub mod api;
pub mod config;
pub mod domain;
pub mod export;
pub mod messaging;
pub mod service;
pub mod store;

use thiserror::Error;

use crate::domain::aggregates::ReviewError;
use crate::domain::services::IneligibilityReason;
use crate::export::ExportError;
use crate::store::StoreError;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum MarketplaceError {
    #[error("Review not found")]
    ReviewNotFound,

    #[error("Cannot review: {0}")]
    Ineligible(IneligibilityReason),

    #[error("{0}")]
    Review(#[from] ReviewError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, MarketplaceError>;
