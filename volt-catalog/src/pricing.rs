use serde::{Deserialize, Serialize};

use crate::product::{normalize_override, PricedProduct, RawProduct};

/// Global pricing rates shared by every product
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PricingConfig {
    /// Cost as a fraction of the card price (0.7 => cost is 70% of the price)
    pub markup_divisor: f64,

    /// Discount applied on the card price for cash / Pix payment (0.05 => 5%)
    pub cash_discount: f64,
}

impl PricingConfig {
    pub fn new(markup_divisor: f64, cash_discount: f64) -> Self {
        Self {
            markup_divisor,
            cash_discount,
        }
    }

    /// Rates that leave the cost untouched: price == cost, no cash discount.
    pub fn neutral() -> Self {
        Self::new(1.0, 0.0)
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self::new(0.7, 0.05)
    }
}

/// A manual override only counts when it holds a strictly positive amount.
pub fn is_override_set(value: Option<f64>) -> bool {
    matches!(value, Some(v) if v > 0.0)
}

/// Round half away from zero to whole cents.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Derive card, cash and automatic prices for one product.
///
/// Never fails: a zero markup divisor falls back to 1 and out-of-range rates
/// are computed through. Rounding happens once per output field; the
/// automatic cash price is taken from the unrounded card price.
pub fn calculate_price(product: &RawProduct, config: &PricingConfig) -> PricedProduct {
    let divisor = if config.markup_divisor == 0.0 {
        1.0
    } else {
        config.markup_divisor
    };
    let base_price = product.cost_price / divisor;

    let card_price = normalize_override(product.manual_price).unwrap_or(base_price);
    let cash_price = normalize_override(product.manual_pix_price)
        .unwrap_or(card_price * (1.0 - config.cash_discount));

    let mut product = product.clone();
    product.attributes.strip_reserved();

    PricedProduct {
        product,
        card_price: round2(card_price),
        cash_price: round2(cash_price),
        auto_calculated_price: round2(base_price),
    }
}

/// Prices a whole snapshot against one set of rates
#[derive(Debug, Clone)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub fn price(&self, product: &RawProduct) -> PricedProduct {
        calculate_price(product, &self.config)
    }

    /// Same order as the input.
    pub fn price_all(&self, products: &[RawProduct]) -> Vec<PricedProduct> {
        products.iter().map(|p| self.price(p)).collect()
    }
}
