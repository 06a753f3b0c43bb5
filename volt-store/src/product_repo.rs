use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};
use uuid::Uuid;
use volt_catalog::listing::compare_names;
use volt_catalog::product::{CREATED_AT, UPDATED_AT};
use volt_catalog::{ProductDraft, ProductPatch, RawProduct};

use crate::events::{CatalogEvent, EventPublisher};
use crate::{StoreError, StoreResult};

/// Repository for the battery catalog
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// All products, alphabetical by name
    async fn list_products(&self) -> StoreResult<Vec<RawProduct>>;

    async fn get_product(&self, id: &str) -> StoreResult<Option<RawProduct>>;

    /// Returns the id assigned to the new product
    async fn create_product(&self, draft: ProductDraft) -> StoreResult<String>;

    async fn update_product(&self, id: &str, patch: ProductPatch) -> StoreResult<RawProduct>;

    async fn delete_product(&self, id: &str) -> StoreResult<()>;

    fn subscribe(&self) -> broadcast::Receiver<CatalogEvent>;
}

pub struct InMemoryProductRepository {
    products: RwLock<HashMap<String, RawProduct>>,
    events: EventPublisher,
}

impl InMemoryProductRepository {
    pub fn new(events: EventPublisher) -> Self {
        Self {
            products: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// Load documents that already carry an id, e.g. an export of the live catalog.
    /// Existing entries with the same id are replaced.
    pub async fn import(&self, products: Vec<RawProduct>) -> usize {
        let count = products.len();
        let changes: Vec<CatalogEvent> = {
            let mut store = self.products.write().await;
            products
                .into_iter()
                .map(|product| {
                    let id = product.id.clone();
                    match store.insert(id.clone(), product) {
                        Some(_) => CatalogEvent::ProductUpdated { id },
                        None => CatalogEvent::ProductCreated { id },
                    }
                })
                .collect()
        };

        info!("Imported {} products", count);
        for event in changes {
            self.events.publish(event);
        }
        count
    }
}

/// ISO-8601 with milliseconds, the format the storefront has always written
fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list_products(&self) -> StoreResult<Vec<RawProduct>> {
        let mut products: Vec<RawProduct> = self.products.read().await.values().cloned().collect();
        products.sort_by(|a, b| compare_names(&a.name, &b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn get_product(&self, id: &str) -> StoreResult<Option<RawProduct>> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn create_product(&self, draft: ProductDraft) -> StoreResult<String> {
        let draft = draft.normalize().map_err(|e| {
            warn!("Rejected new product: {}", e);
            StoreError::from(e)
        })?;

        let id = Uuid::new_v4().to_string();
        let mut product = RawProduct {
            id: id.clone(),
            name: draft.name,
            cost_price: draft.cost_price,
            active: true,
            manual_price: draft.manual_price,
            manual_pix_price: draft.manual_pix_price,
            attributes: draft.attributes,
        };
        product.set_stamp(CREATED_AT, timestamp_now());

        info!("Created product {} ({})", product.name, id);
        self.products.write().await.insert(id.clone(), product);
        self.events.publish(CatalogEvent::ProductCreated { id: id.clone() });

        Ok(id)
    }

    async fn update_product(&self, id: &str, patch: ProductPatch) -> StoreResult<RawProduct> {
        let updated = {
            let mut store = self.products.write().await;
            let product = store
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

            patch.apply_to(product).map_err(|e| {
                warn!("Rejected update of product {}: {}", id, e);
                StoreError::from(e)
            })?;
            product.set_stamp(UPDATED_AT, timestamp_now());
            product.clone()
        };

        info!("Updated product {}", id);
        self.events.publish(CatalogEvent::ProductUpdated { id: id.to_string() });

        Ok(updated)
    }

    async fn delete_product(&self, id: &str) -> StoreResult<()> {
        let removed = self.products.write().await.remove(id);
        if removed.is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }

        info!("Deleted product {}", id);
        self.events.publish(CatalogEvent::ProductDeleted { id: id.to_string() });

        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events.subscribe()
    }
}
