pub mod backend;
pub mod coingecko;
pub mod frankfurter;
pub mod simulated;
pub mod util;
pub mod yahoo_finance;

use crate::core::asset::{AssetCategory, Instrument};
use crate::core::catalog::Catalog;
use crate::core::config::{EquitySource, ProvidersConfig};
use crate::core::feed::FeedAdapter;
use std::sync::Arc;

fn instruments(catalog: &Catalog, category: AssetCategory) -> Vec<Instrument> {
    catalog.by_category(category).cloned().collect()
}

/// One adapter per asset category, wired to the configured endpoints.
pub fn build_adapters(config: &ProvidersConfig, catalog: &Catalog) -> Vec<Arc<dyn FeedAdapter>> {
    let equities: Arc<dyn FeedAdapter> = match config.equities {
        EquitySource::Simulated => Arc::new(simulated::SimulatedFeed::equities(instruments(
            catalog,
            AssetCategory::Equity,
        ))),
        EquitySource::Yahoo => Arc::new(yahoo_finance::YahooQuoteFeed::new(
            &config.yahoo.base_url,
            instruments(catalog, AssetCategory::Equity),
        )),
    };

    let crypto: Arc<dyn FeedAdapter> = Arc::new(coingecko::CoinGeckoFeed::new(
        &config.coingecko.base_url,
        instruments(catalog, AssetCategory::Crypto),
    ));
    let forex: Arc<dyn FeedAdapter> = Arc::new(frankfurter::ForexFeed::new(
        &config.frankfurter.base_url,
        instruments(catalog, AssetCategory::Forex),
    ));
    let commodities: Arc<dyn FeedAdapter> = Arc::new(simulated::SimulatedFeed::commodities(
        instruments(catalog, AssetCategory::Commodity),
    ));

    vec![crypto, forex, commodities, equities]
}
