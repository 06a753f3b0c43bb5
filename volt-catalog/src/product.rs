use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::pricing::is_override_set;

/// Descriptive battery attributes. Never read by the pricing engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductAttributes {
    /// e.g. "12 meses"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warranty: Option<String>,

    /// Cold cranking amps, e.g. "450"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cca: Option<String>,

    /// Cranking amps, e.g. "550"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca: Option<String>,

    /// Reserve capacity, e.g. "80min"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rc: Option<String>,

    /// "Selada", "EFB", "AGM", ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology: Option<String>,

    /// Public URL handed back by the image host, stored verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Any other field present on the stored document
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Product as persisted by the product store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawProduct {
    pub id: String,
    pub name: String,
    pub cost_price: f64,

    #[serde(default = "default_active")]
    pub active: bool,

    /// Card price override. Zero, negative or null means "not set".
    #[serde(default)]
    pub manual_price: Option<f64>,

    /// Cash (Pix) price override. Same semantics as `manual_price`.
    #[serde(default)]
    pub manual_pix_price: Option<f64>,

    #[serde(flatten)]
    pub attributes: ProductAttributes,
}

fn default_active() -> bool {
    true
}

/// Stamp keys written by the product store. Kept verbatim in the pass-through map.
pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";

impl RawProduct {
    pub fn created_at(&self) -> Option<&Value> {
        self.attributes.extra.get(CREATED_AT)
    }

    pub fn updated_at(&self) -> Option<&Value> {
        self.attributes.extra.get(UPDATED_AT)
    }

    /// Overwrite a stamp, e.g. with an ISO-8601 string from the store.
    pub fn set_stamp(&mut self, key: &str, value: impl Into<String>) {
        self.attributes
            .extra
            .insert(key.to_string(), Value::String(value.into()));
    }
}

/// Keys owned by typed fields of `RawProduct` or `PricedProduct`
const RESERVED_FIELDS: &[&str] = &[
    "id",
    "name",
    "costPrice",
    "active",
    "manualPrice",
    "manualPixPrice",
    "cardPrice",
    "cashPrice",
    "autoCalculatedPrice",
];

impl ProductAttributes {
    /// Drop pass-through keys that would collide with typed fields on output.
    pub fn strip_reserved(&mut self) {
        self.extra
            .retain(|key, _| !RESERVED_FIELDS.contains(&key.as_str()));
    }
}

/// Product with its derived prices. Output only, never persisted.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PricedProduct {
    #[serde(flatten)]
    pub product: RawProduct,

    pub card_price: f64,
    pub cash_price: f64,

    /// Card price the markup rule yields, kept even when a manual price wins
    pub auto_calculated_price: f64,
}

impl PricedProduct {
    pub fn has_manual_price(&self) -> bool {
        is_override_set(self.product.manual_price)
    }

    pub fn has_manual_pix_price(&self) -> bool {
        is_override_set(self.product.manual_pix_price)
    }
}

/// Input for creating a product
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    pub cost_price: f64,

    #[serde(default)]
    pub manual_price: Option<f64>,

    #[serde(default)]
    pub manual_pix_price: Option<f64>,

    #[serde(flatten)]
    pub attributes: ProductAttributes,
}

impl ProductDraft {
    pub fn new(name: impl Into<String>, cost_price: f64) -> Self {
        Self {
            name: name.into(),
            cost_price,
            ..Default::default()
        }
    }

    /// Trim the name, check the cost and clear overrides that are not set.
    pub fn normalize(mut self) -> Result<Self, ProductError> {
        self.name = normalize_name(&self.name)?;
        check_cost(self.cost_price)?;
        self.manual_price = normalize_override(self.manual_price);
        self.manual_pix_price = normalize_override(self.manual_pix_price);
        self.attributes.strip_reserved();
        Ok(self)
    }
}

/// Field-level update of a stored product.
///
/// Both manual overrides are always written: leaving one out (or sending 0)
/// clears it, which is how the admin form behaves when an override is erased.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub cost_price: Option<f64>,

    #[serde(default)]
    pub active: Option<bool>,

    #[serde(default)]
    pub manual_price: Option<f64>,

    #[serde(default)]
    pub manual_pix_price: Option<f64>,

    #[serde(default)]
    pub warranty: Option<String>,

    #[serde(default)]
    pub cca: Option<String>,

    #[serde(default)]
    pub ca: Option<String>,

    #[serde(default)]
    pub rc: Option<String>,

    #[serde(default)]
    pub technology: Option<String>,

    #[serde(default)]
    pub image_url: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProductPatch {
    /// Apply onto `product`. Nothing is written if validation fails.
    pub fn apply_to(self, product: &mut RawProduct) -> Result<(), ProductError> {
        let name = self.name.as_deref().map(normalize_name).transpose()?;
        if let Some(cost) = self.cost_price {
            check_cost(cost)?;
        }

        if let Some(name) = name {
            product.name = name;
        }
        if let Some(cost) = self.cost_price {
            product.cost_price = cost;
        }
        if let Some(active) = self.active {
            product.active = active;
        }
        product.manual_price = normalize_override(self.manual_price);
        product.manual_pix_price = normalize_override(self.manual_pix_price);

        let attrs = &mut product.attributes;
        replace_if_some(&mut attrs.warranty, self.warranty);
        replace_if_some(&mut attrs.cca, self.cca);
        replace_if_some(&mut attrs.ca, self.ca);
        replace_if_some(&mut attrs.rc, self.rc);
        replace_if_some(&mut attrs.technology, self.technology);
        replace_if_some(&mut attrs.image_url, self.image_url);
        let mut extra = self.extra;
        extra.remove(CREATED_AT);
        attrs.extra.extend(extra);
        attrs.strip_reserved();

        Ok(())
    }
}

fn replace_if_some(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

fn normalize_name(name: &str) -> Result<String, ProductError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ProductError::EmptyName);
    }
    Ok(trimmed.to_string())
}

fn check_cost(cost: f64) -> Result<(), ProductError> {
    if !cost.is_finite() || cost < 0.0 {
        return Err(ProductError::InvalidCost(cost));
    }
    Ok(())
}

pub(crate) fn normalize_override(value: Option<f64>) -> Option<f64> {
    value.filter(|v| is_override_set(Some(*v)))
}

/// Product-related errors
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ProductError {
    #[error("Product name must not be empty")]
    EmptyName,

    #[error("Invalid cost price: {0}")]
    InvalidCost(f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_product_keeps_unknown_fields() {
        let doc = json!({
            "id": "abc",
            "name": "Moura 60Ah",
            "costPrice": 320.5,
            "active": true,
            "manualPrice": null,
            "warranty": "18 meses",
            "cca": "450",
            "imageUrl": "https://i.ibb.co/x/moura.png",
            "supplierCode": "M60GD"
        });

        let product: RawProduct = serde_json::from_value(doc).unwrap();
        assert_eq!(product.manual_price, None);
        assert_eq!(product.manual_pix_price, None);
        assert_eq!(product.attributes.warranty.as_deref(), Some("18 meses"));
        assert_eq!(product.attributes.extra["supplierCode"], json!("M60GD"));

        let back = serde_json::to_value(&product).unwrap();
        assert_eq!(back["supplierCode"], json!("M60GD"));
        assert_eq!(back["imageUrl"], json!("https://i.ibb.co/x/moura.png"));
        assert_eq!(back["costPrice"], json!(320.5));
    }

    #[test]
    fn test_missing_active_defaults_to_true() {
        let product: RawProduct = serde_json::from_value(json!({
            "id": "1", "name": "Heliar 45Ah", "costPrice": 250
        }))
        .unwrap();
        assert!(product.active);
        assert_eq!(product.cost_price, 250.0);
    }

    #[test]
    fn test_draft_normalize() {
        let draft = ProductDraft {
            name: "  Zetta 50Ah ".to_string(),
            cost_price: 210.0,
            manual_price: Some(0.0),
            manual_pix_price: Some(-3.0),
            ..Default::default()
        };

        let draft = draft.normalize().unwrap();
        assert_eq!(draft.name, "Zetta 50Ah");
        assert_eq!(draft.manual_price, None);
        assert_eq!(draft.manual_pix_price, None);
    }

    #[test]
    fn test_draft_rejects_blank_name_and_bad_cost() {
        assert_eq!(
            ProductDraft::new("   ", 10.0).normalize(),
            Err(ProductError::EmptyName)
        );
        assert_eq!(
            ProductDraft::new("Moura", -1.0).normalize(),
            Err(ProductError::InvalidCost(-1.0))
        );
        assert!(ProductDraft::new("Moura", f64::NAN).normalize().is_err());
    }

    #[test]
    fn test_patch_clears_overrides_and_keeps_attributes() {
        let mut product: RawProduct = serde_json::from_value(json!({
            "id": "1",
            "name": "Moura 60Ah",
            "costPrice": 300,
            "manualPrice": 450,
            "manualPixPrice": 420,
            "technology": "EFB"
        }))
        .unwrap();

        let patch = ProductPatch {
            cost_price: Some(310.0),
            manual_pix_price: Some(415.0),
            ..Default::default()
        };
        patch.apply_to(&mut product).unwrap();

        assert_eq!(product.cost_price, 310.0);
        assert_eq!(product.manual_price, None);
        assert_eq!(product.manual_pix_price, Some(415.0));
        assert_eq!(product.attributes.technology.as_deref(), Some("EFB"));
        assert_eq!(product.name, "Moura 60Ah");
    }

    #[test]
    fn test_patch_cannot_rewrite_creation_stamp() {
        let mut product: RawProduct = serde_json::from_value(json!({
            "id": "1", "name": "Moura 60Ah", "costPrice": 300,
            "createdAt": "2024-03-01T12:00:00.000Z"
        }))
        .unwrap();

        let mut patch = ProductPatch::default();
        patch.extra.insert(CREATED_AT.to_string(), json!("1999-01-01T00:00:00.000Z"));
        patch.apply_to(&mut product).unwrap();

        assert_eq!(product.created_at(), Some(&json!("2024-03-01T12:00:00.000Z")));
    }

    #[test]
    fn test_rejected_patch_leaves_product_untouched() {
        let mut product: RawProduct = serde_json::from_value(json!({
            "id": "1", "name": "Moura 60Ah", "costPrice": 300, "manualPrice": 450
        }))
        .unwrap();
        let before = product.clone();

        let patch = ProductPatch {
            name: Some(" ".to_string()),
            cost_price: Some(1.0),
            ..Default::default()
        };
        assert_eq!(patch.apply_to(&mut product), Err(ProductError::EmptyName));
        assert_eq!(product, before);
    }
}
