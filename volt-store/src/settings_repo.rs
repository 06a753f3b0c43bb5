use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};
use volt_catalog::PricingConfig;

use crate::events::{CatalogEvent, EventPublisher};
use crate::{StoreError, StoreResult};

/// Merge-style write of the global rates. `None` keeps the stored value.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RatesUpdate {
    #[serde(default)]
    pub markup_divisor: Option<f64>,
    #[serde(default)]
    pub cash_discount: Option<f64>,
}

impl RatesUpdate {
    fn merge_into(self, current: PricingConfig) -> PricingConfig {
        PricingConfig {
            markup_divisor: self.markup_divisor.unwrap_or(current.markup_divisor),
            cash_discount: self.cash_discount.unwrap_or(current.cash_discount),
        }
    }
}

impl From<PricingConfig> for RatesUpdate {
    fn from(config: PricingConfig) -> Self {
        Self {
            markup_divisor: Some(config.markup_divisor),
            cash_discount: Some(config.cash_discount),
        }
    }
}

/// Storage of the single global rates document
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// `None` until rates are saved for the first time
    async fn stored_rates(&self) -> StoreResult<Option<PricingConfig>>;

    async fn merge_rates(&self, update: RatesUpdate) -> StoreResult<PricingConfig>;

    fn subscribe(&self) -> broadcast::Receiver<CatalogEvent>;
}

pub struct InMemorySettingsRepository {
    rates: RwLock<Option<PricingConfig>>,
    /// Fills fields the first merge leaves out
    base: PricingConfig,
    events: EventPublisher,
}

impl InMemorySettingsRepository {
    pub fn new(base: PricingConfig, events: EventPublisher) -> Self {
        Self {
            rates: RwLock::new(None),
            base,
            events,
        }
    }
}

#[async_trait]
impl SettingsRepository for InMemorySettingsRepository {
    async fn stored_rates(&self) -> StoreResult<Option<PricingConfig>> {
        Ok(*self.rates.read().await)
    }

    async fn merge_rates(&self, update: RatesUpdate) -> StoreResult<PricingConfig> {
        let merged = {
            let mut rates = self.rates.write().await;
            let merged = update.merge_into(rates.unwrap_or(self.base));
            *rates = Some(merged);
            merged
        };

        self.events.publish(CatalogEvent::RatesUpdated { rates: merged });
        Ok(merged)
    }

    fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events.subscribe()
    }
}

/// Read and validated update of the global rates, as used by the admin settings form
#[derive(Clone)]
pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
    defaults: PricingConfig,
}

impl SettingsService {
    pub fn new(repo: Arc<dyn SettingsRepository>, defaults: PricingConfig) -> Self {
        Self { repo, defaults }
    }

    /// Stored rates, or the configured defaults when nothing was saved yet
    pub async fn global_rates(&self) -> StoreResult<PricingConfig> {
        Ok(self.repo.stored_rates().await?.unwrap_or(self.defaults))
    }

    pub async fn update_global_rates(&self, config: PricingConfig) -> StoreResult<PricingConfig> {
        if let Err(e) = validate_rates(&config) {
            warn!("Rejected pricing rates {:?}: {}", config, e);
            return Err(e);
        }

        let saved = self.repo.merge_rates(config.into()).await?;
        info!(
            "Pricing rates updated: markup divisor {}, cash discount {}",
            saved.markup_divisor, saved.cash_discount
        );
        Ok(saved)
    }

    /// Same as `update_global_rates` with the discount given in whole percent (5 => 0.05).
    pub async fn update_from_percent(
        &self,
        markup_divisor: f64,
        cash_discount_percent: f64,
    ) -> StoreResult<PricingConfig> {
        self.update_global_rates(PricingConfig::new(markup_divisor, cash_discount_percent / 100.0))
            .await
    }
}

pub fn validate_rates(config: &PricingConfig) -> StoreResult<()> {
    let markup = config.markup_divisor;
    if !markup.is_finite() || markup <= 0.0 || markup > 1.0 {
        return Err(StoreError::InvalidSettings(format!(
            "markup divisor must be greater than 0 and at most 1, got {}",
            markup
        )));
    }

    let discount = config.cash_discount;
    if !discount.is_finite() || !(0.0..=1.0).contains(&discount) {
        return Err(StoreError::InvalidSettings(format!(
            "cash discount must be between 0 and 1, got {}",
            discount
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rates() {
        assert!(validate_rates(&PricingConfig::new(0.7, 0.05)).is_ok());
        assert!(validate_rates(&PricingConfig::new(1.0, 0.0)).is_ok());
        assert!(validate_rates(&PricingConfig::new(0.01, 1.0)).is_ok());

        assert!(validate_rates(&PricingConfig::new(0.0, 0.05)).is_err());
        assert!(validate_rates(&PricingConfig::new(1.2, 0.05)).is_err());
        assert!(validate_rates(&PricingConfig::new(-0.5, 0.05)).is_err());
        assert!(validate_rates(&PricingConfig::new(f64::NAN, 0.05)).is_err());
        assert!(validate_rates(&PricingConfig::new(0.7, 1.5)).is_err());
        assert!(validate_rates(&PricingConfig::new(0.7, -0.1)).is_err());
    }

    #[test]
    fn test_partial_update_keeps_other_rate() {
        let current = PricingConfig::new(0.7, 0.05);
        let update = RatesUpdate {
            markup_divisor: None,
            cash_discount: Some(0.1),
        };
        assert_eq!(update.merge_into(current), PricingConfig::new(0.7, 0.1));
    }
}
