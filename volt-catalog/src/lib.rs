pub mod product;
pub mod pricing;
pub mod listing;
pub mod money;

pub use product::{PricedProduct, ProductAttributes, ProductDraft, ProductError, ProductPatch, RawProduct};
pub use pricing::{calculate_price, is_override_set, round2, PricingConfig, PricingEngine};
pub use money::format_brl;
