use std::sync::Arc;

use crate::export::TabularExporter;
use crate::messaging::EventPublisher;
use crate::service::{review_exporter, ReviewService};

/// Shared handler state. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub reviews: Arc<ReviewService>,
    pub exporter: Arc<TabularExporter>,
    pub review_exporter: Arc<TabularExporter>,
    pub publisher: EventPublisher,
}

impl AppState {
    pub fn new(reviews: ReviewService, publisher: EventPublisher) -> Self {
        Self {
            reviews: Arc::new(reviews),
            exporter: Arc::new(TabularExporter::new()),
            review_exporter: Arc::new(review_exporter()),
            publisher,
        }
    }
}
