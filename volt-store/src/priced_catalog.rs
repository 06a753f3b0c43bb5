use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;
use volt_catalog::listing::search_and_sort;
use volt_catalog::{PricedProduct, PricingConfig, PricingEngine};

use crate::app_config::Config;
use crate::events::{CatalogEvent, EventPublisher};
use crate::product_repo::{InMemoryProductRepository, ProductRepository};
use crate::settings_repo::{InMemorySettingsRepository, SettingsRepository};
use crate::StoreResult;

/// Live, priced view over the product and settings stores.
///
/// Prices are never stored: every read takes a fresh snapshot of both stores
/// and runs it through the pricing engine.
#[derive(Clone)]
pub struct PricedCatalog {
    products: Arc<dyn ProductRepository>,
    settings: Arc<dyn SettingsRepository>,
    live_fallback: PricingConfig,
    events: EventPublisher,
}

impl PricedCatalog {
    /// `events` should be the publisher both stores were built with.
    pub fn new(
        products: Arc<dyn ProductRepository>,
        settings: Arc<dyn SettingsRepository>,
        live_fallback: PricingConfig,
        events: EventPublisher,
    ) -> Self {
        Self {
            products,
            settings,
            live_fallback,
            events,
        }
    }

    /// In-memory stores sharing one event channel
    pub fn in_memory(config: &Config) -> Self {
        let events = EventPublisher::new(config.store.event_capacity);
        let products = Arc::new(InMemoryProductRepository::new(events.clone()));
        let settings = Arc::new(InMemorySettingsRepository::new(
            config.pricing.default_rates.into(),
            events.clone(),
        ));

        Self::new(products, settings, config.pricing.live_fallback_rates.into(), events)
    }

    pub fn products(&self) -> Arc<dyn ProductRepository> {
        self.products.clone()
    }

    pub fn settings(&self) -> Arc<dyn SettingsRepository> {
        self.settings.clone()
    }

    /// Stored rates, or the live fallback when nothing was saved yet
    pub async fn current_rates(&self) -> StoreResult<PricingConfig> {
        Ok(self.settings.stored_rates().await?.unwrap_or(self.live_fallback))
    }

    /// Every product priced with the current rates, alphabetical
    pub async fn priced_products(&self) -> StoreResult<Vec<PricedProduct>> {
        let rates = self.current_rates().await?;
        let products = self.products.list_products().await?;

        let priced = PricingEngine::new(rates).price_all(&products);
        debug!("Priced {} products with {:?}", priced.len(), rates);
        Ok(priced)
    }

    /// Public catalog: priced products whose name contains `term`, alphabetical
    pub async fn browse(&self, term: &str) -> StoreResult<Vec<PricedProduct>> {
        Ok(search_and_sort(self.priced_products().await?, term))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events.subscribe()
    }
}
