use serde::Deserialize;
use std::env;
use volt_catalog::PricingConfig;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    pub pricing: PricingSettings,
    #[serde(default)]
    pub store: StoreSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PricingSettings {
    /// Returned by a settings read when no rates were ever saved
    pub default_rates: RatesConfig,
    /// Used to price the live catalog before any rates were saved
    pub live_fallback_rates: RatesConfig,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            default_rates: PricingConfig::default().into(),
            live_fallback_rates: PricingConfig::neutral().into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct RatesConfig {
    pub markup_divisor: f64,
    pub cash_discount: f64,
}

impl From<RatesConfig> for PricingConfig {
    fn from(rates: RatesConfig) -> Self {
        PricingConfig::new(rates.markup_divisor, rates.cash_discount)
    }
}

impl From<PricingConfig> for RatesConfig {
    fn from(config: PricingConfig) -> Self {
        Self {
            markup_divisor: config.markup_divisor,
            cash_discount: config.cash_discount,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_event_capacity() -> usize { 64 }

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            event_capacity: default_event_capacity(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `VOLT__PRICING__DEFAULT_RATES__CASH_DISCOUNT=0.1`
            .add_source(config::Environment::with_prefix("VOLT").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn from_toml(source: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
