pub mod app_config;
pub mod events;
pub mod product_repo;
pub mod settings_repo;
pub mod priced_catalog;

pub use events::{CatalogEvent, EventPublisher};
pub use product_repo::{InMemoryProductRepository, ProductRepository};
pub use settings_repo::{InMemorySettingsRepository, RatesUpdate, SettingsRepository, SettingsService};
pub use priced_catalog::PricedCatalog;

use volt_catalog::ProductError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Product not found: {0}")]
    NotFound(String),
    #[error("Invalid product: {0}")]
    InvalidProduct(#[from] ProductError),
    #[error("Invalid pricing settings: {0}")]
    InvalidSettings(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
