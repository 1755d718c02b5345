//! Domain event publishing over NATS.

use crate::domain::events::DomainEvent;

/// Publishes domain events as JSON to `{prefix}.{event subject}`.
///
/// Without a NATS connection every publish is a no-op. Publish failures
/// are logged and swallowed.
#[derive(Clone, Default)]
pub struct EventPublisher {
    client: Option<async_nats::Client>,
    prefix: String,
}

impl std::fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPublisher").field("enabled", &self.is_enabled()).field("prefix", &self.prefix).finish()
    }
}

impl EventPublisher {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub async fn connect(url: Option<&str>, prefix: &str) -> Self {
        let client = match url {
            Some(url) => match async_nats::connect(url).await {
                Ok(client) => {
                    tracing::info!(url, "connected to NATS");
                    Some(client)
                }
                Err(err) => {
                    tracing::warn!(url, error = %err, "NATS unavailable, events will not be published");
                    None
                }
            },
            None => None,
        };
        Self { client, prefix: prefix.to_string() }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub fn subject_for(&self, event: &DomainEvent) -> String {
        if self.prefix.is_empty() {
            event.subject().to_string()
        } else {
            format!("{}.{}", self.prefix, event.subject())
        }
    }

    pub async fn publish(&self, event: &DomainEvent) {
        let Some(client) = &self.client else {
            tracing::debug!(subject = event.subject(), "event publishing disabled");
            return;
        };
        let subject = self.subject_for(event);
        let payload = match serde_json::to_vec(event) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(%subject, error = %err, "failed to encode event");
                return;
            }
        };
        if let Err(err) = client.publish(subject.clone(), payload.into()).await {
            tracing::warn!(%subject, error = %err, "failed to publish event");
        }
    }

    pub async fn publish_all(&self, events: Vec<DomainEvent>) {
        for event in &events {
            self.publish(event).await;
        }
    }
}
