//! Domain events
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DomainEvent {
    Review(ReviewEvent),
    Export(ExportEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReviewEvent {
    Submitted { review_id: Uuid, product_id: Uuid, customer_id: Uuid, rating: u8, verified_purchase: bool },
    Approved { review_id: Uuid, product_id: Uuid },
    Rejected { review_id: Uuid, product_id: Uuid },
    Reported { review_id: Uuid, product_id: Uuid },
    Deleted { review_id: Uuid, product_id: Uuid },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExportEvent {
    Generated { filename: String, rows: usize },
}

impl DomainEvent {
    /// Subject suffix the event is published under.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Review(ReviewEvent::Submitted { .. }) => "review.submitted",
            Self::Review(ReviewEvent::Approved { .. }) => "review.approved",
            Self::Review(ReviewEvent::Rejected { .. }) => "review.rejected",
            Self::Review(ReviewEvent::Reported { .. }) => "review.reported",
            Self::Review(ReviewEvent::Deleted { .. }) => "review.deleted",
            Self::Export(ExportEvent::Generated { .. }) => "export.generated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_event_payload_is_tagged() {
        let id = Uuid::nil();
        let event = DomainEvent::Review(ReviewEvent::Approved { review_id: id, product_id: id });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "approved");
        assert_eq!(event.subject(), "review.approved");
    }
}
