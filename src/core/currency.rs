//! Currency conversion abstractions

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tracing::debug;

/// The currency all prices and catalog economics are quoted in.
pub const BASE_CURRENCY: &str = "USD";

#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64>;
}

/// Converts USD economics amounts into the active display currency.
///
/// Must be cheap and synchronous; it is called while the market state is
/// being mutated. Only minimum investments and incomes go through it.
pub trait CurrencyConverter: Send + Sync {
    fn currency(&self) -> &str;

    fn convert(&self, amount: f64) -> f64;
}

/// Fixed-rate converter resolved once per display currency.
#[derive(Debug, Clone, PartialEq)]
pub struct RateConverter {
    currency: String,
    rate: f64,
}

impl RateConverter {
    pub fn new(currency: &str, rate: f64) -> Result<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            bail!("Invalid conversion rate {} for {}", rate, currency);
        }
        Ok(Self {
            currency: currency.to_uppercase(),
            rate,
        })
    }

    pub fn identity() -> Self {
        Self {
            currency: BASE_CURRENCY.to_string(),
            rate: 1.0,
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Looks up the USD rate for `currency` through `provider`.
    pub async fn resolve(provider: &dyn CurrencyRateProvider, currency: &str) -> Result<Self> {
        let currency = currency.to_uppercase();
        if currency == BASE_CURRENCY {
            return Ok(Self::identity());
        }
        let rate = provider
            .get_rate(BASE_CURRENCY, &currency)
            .await
            .with_context(|| format!("Failed to resolve conversion rate for {currency}"))?;
        debug!("Resolved {BASE_CURRENCY} -> {currency} at rate {rate}");
        Self::new(&currency, rate)
    }
}

impl Default for RateConverter {
    fn default() -> Self {
        Self::identity()
    }
}

impl CurrencyConverter for RateConverter {
    fn currency(&self) -> &str {
        &self.currency
    }

    fn convert(&self, amount: f64) -> f64 {
        amount * self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct MockCurrencyProvider {
        rate: Option<f64>,
    }

    #[async_trait]
    impl CurrencyRateProvider for MockCurrencyProvider {
        async fn get_rate(&self, from: &str, to: &str) -> Result<f64> {
            self.rate
                .ok_or_else(|| anyhow!("Rate not found for {} to {}", from, to))
        }
    }

    #[tokio::test]
    async fn test_resolve_usd_skips_provider() {
        let provider = MockCurrencyProvider { rate: None };
        let converter = RateConverter::resolve(&provider, "usd").await.unwrap();
        assert_eq!(converter, RateConverter::identity());
        assert_eq!(converter.convert(600.0), 600.0);
    }

    #[tokio::test]
    async fn test_resolve_uses_provider_rate() {
        let provider = MockCurrencyProvider { rate: Some(0.5) };
        let converter = RateConverter::resolve(&provider, "eur").await.unwrap();
        assert_eq!(converter.currency(), "EUR");
        assert_eq!(converter.convert(600.0), 300.0);
    }

    #[tokio::test]
    async fn test_resolve_propagates_provider_error() {
        let provider = MockCurrencyProvider { rate: None };
        let result = RateConverter::resolve(&provider, "KES").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Failed to resolve conversion rate for KES"
        );
    }

    #[test]
    fn test_rejects_bad_rates() {
        assert!(RateConverter::new("EUR", 0.0).is_err());
        assert!(RateConverter::new("EUR", f64::INFINITY).is_err());
    }
}
