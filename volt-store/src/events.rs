use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;
use volt_catalog::PricingConfig;

/// Change notification published by the product and settings stores
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CatalogEvent {
    ProductCreated { id: String },
    ProductUpdated { id: String },
    ProductDeleted { id: String },
    RatesUpdated { rates: PricingConfig },
}

/// Fan-out of catalog changes to every subscriber. Clones share one channel.
#[derive(Clone)]
pub struct EventPublisher {
    tx: broadcast::Sender<CatalogEvent>,
}

impl EventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: CatalogEvent) {
        match self.tx.send(event) {
            Ok(receivers) => debug!("Catalog event delivered to {} subscriber(s)", receivers),
            Err(broadcast::error::SendError(event)) => {
                debug!("No subscribers for catalog event {:?}", event)
            }
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(64)
    }
}
