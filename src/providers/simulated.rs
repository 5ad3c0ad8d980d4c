//! Stand-in sources for categories without a free live feed.

use crate::core::asset::{AssetCategory, Instrument};
use crate::core::feed::{FeedAdapter, FeedMapping, FeedQuote};
use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;

/// Perturbs every baseline independently on each fetch.
pub struct SimulatedFeed {
    category: AssetCategory,
    instruments: Vec<Instrument>,
    /// Relative price spread, e.g. `0.01` for ±1%.
    price_jitter: f64,
    /// Absolute spread applied to the baseline change, in percentage points.
    change_jitter: f64,
}

impl SimulatedFeed {
    pub fn new(
        category: AssetCategory,
        instruments: Vec<Instrument>,
        price_jitter: f64,
        change_jitter: f64,
    ) -> Self {
        Self {
            category,
            instruments,
            price_jitter: price_jitter.abs(),
            change_jitter: change_jitter.abs(),
        }
    }

    pub fn commodities(instruments: Vec<Instrument>) -> Self {
        Self::new(AssetCategory::Commodity, instruments, 0.01, 0.25)
    }

    pub fn equities(instruments: Vec<Instrument>) -> Self {
        Self::new(AssetCategory::Equity, instruments, 0.005, 0.15)
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> FeedMapping {
        self.instruments
            .iter()
            .map(|instrument| {
                let quote = FeedQuote {
                    price: instrument.baseline_price * (1.0 + spread(rng, self.price_jitter)),
                    change_percent: instrument.baseline_change_percent
                        + spread(rng, self.change_jitter),
                };
                (instrument.feed_key.clone(), quote)
            })
            .collect()
    }
}

fn spread<R: Rng>(rng: &mut R, width: f64) -> f64 {
    if width == 0.0 {
        0.0
    } else {
        rng.random_range(-width..=width)
    }
}

#[async_trait]
impl FeedAdapter for SimulatedFeed {
    fn category(&self) -> AssetCategory {
        self.category
    }

    fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    async fn fetch_live(&self) -> Result<FeedMapping> {
        Ok(self.sample(&mut rand::rng()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::Catalog;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn instruments(category: AssetCategory) -> Vec<Instrument> {
        Catalog::builtin().by_category(category).cloned().collect()
    }

    #[test]
    fn test_commodity_samples_stay_within_bounds() {
        let feed = SimulatedFeed::commodities(instruments(AssetCategory::Commodity));
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let mapping = feed.sample(&mut rng);
            assert_eq!(mapping.len(), 5);
            for instrument in feed.instruments() {
                let quote = mapping[&instrument.feed_key];
                let ratio = quote.price / instrument.baseline_price;
                assert!((0.99 - 1e-9..=1.01 + 1e-9).contains(&ratio), "ratio {ratio}");
                let shift = quote.change_percent - instrument.baseline_change_percent;
                assert!(shift.abs() <= 0.25 + 1e-12);
            }
        }
    }

    #[test]
    fn test_equity_samples_stay_within_bounds() {
        let feed = SimulatedFeed::equities(instruments(AssetCategory::Equity));
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let mapping = feed.sample(&mut rng);
            for instrument in feed.instruments() {
                let ratio = mapping[&instrument.feed_key].price / instrument.baseline_price;
                assert!((0.995 - 1e-9..=1.005 + 1e-9).contains(&ratio), "ratio {ratio}");
            }
        }
    }

    #[test]
    fn test_zero_jitter_reproduces_baselines() {
        let feed = SimulatedFeed::new(
            AssetCategory::Equity,
            instruments(AssetCategory::Equity),
            0.0,
            0.0,
        );
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(feed.sample(&mut rng), feed.fallback());
    }

    #[tokio::test]
    async fn test_fetch_covers_every_instrument() {
        let feed = SimulatedFeed::commodities(instruments(AssetCategory::Commodity));
        let mapping = feed.fetch().await;
        assert_eq!(mapping.len(), 5);
        assert!(mapping.values().all(|quote| quote.price > 0.0));
    }
}
