//! Built-in instrument catalog.

use crate::core::asset::{AssetCategory, Instrument};
use std::collections::HashMap;

struct Seed {
    id: &'static str,
    name: &'static str,
    symbol: &'static str,
    feed_key: &'static str,
    price: f64,
    change: f64,
    hourly_income: f64,
    min_investment: f64,
    duration_hours: f64,
    chart_symbol: &'static str,
}

macro_rules! seed {
    ($id:literal, $name:literal, $symbol:literal, $key:literal, $price:expr, $change:expr, $income:expr, $min:expr, $hours:expr, $chart:literal) => {
        Seed {
            id: $id,
            name: $name,
            symbol: $symbol,
            feed_key: $key,
            price: $price,
            change: $change,
            hourly_income: $income,
            min_investment: $min,
            duration_hours: $hours,
            chart_symbol: $chart,
        }
    };
}

// Crypto feed keys are CoinGecko coin ids.
const CRYPTO: &[Seed] = &[
    seed!("bitcoin", "Bitcoin", "BTC", "bitcoin", 45000.0, 2.34, 120.0, 600.0, 20.0, "BINANCE:BTCUSDT"),
    seed!("ethereum", "Ethereum", "ETH", "ethereum", 3000.0, 1.23, 95.0, 500.0, 12.0, "BINANCE:ETHUSDT"),
    seed!("tether", "Tether", "USDT", "tether", 1.00, 0.01, 90.0, 450.0, 6.0, "BINANCE:USDTUSD"),
    seed!("usd-coin", "USD Coin", "USDC", "usd-coin", 1.00, 0.02, 110.0, 550.0, 10.0, "BINANCE:USDCUSD"),
    seed!("binance-coin", "Binance Coin", "BNB", "binancecoin", 312.67, -0.45, 100.0, 500.0, 4.0, "BINANCE:BNBUSDT"),
    seed!("ripple", "Ripple", "XRP", "ripple", 0.6234, 3.21, 95.0, 475.0, 6.0, "BINANCE:XRPUSDT"),
    seed!("cardano", "Cardano", "ADA", "cardano", 0.4523, 1.89, 105.0, 525.0, 10.0, "BINANCE:ADAUSDT"),
    seed!("solana", "Solana", "SOL", "solana", 98.76, 4.56, 135.0, 600.0, 12.0, "BINANCE:SOLUSDT"),
    seed!("polkadot", "Polkadot", "DOT", "polkadot", 6.78, -1.23, 90.0, 450.0, 4.0, "BINANCE:DOTUSDT"),
    seed!("dogecoin", "Dogecoin", "DOGE", "dogecoin", 0.0789, 5.67, 92.5, 400.0, 6.0, "BINANCE:DOGEUSDT"),
];

// Forex feed keys are six-letter BASEQUOTE pairs.
const FOREX: &[Seed] = &[
    seed!("eur-usd", "EUR/USD", "EURUSD", "EURUSD", 1.0856, 0.12, 125.0, 600.0, 10.0, "FX:EURUSD"),
    seed!("gbp-usd", "GBP/USD", "GBPUSD", "GBPUSD", 1.2678, -0.23, 150.0, 600.0, 12.0, "FX:GBPUSD"),
    seed!("usd-jpy", "USD/JPY", "USDJPY", "USDJPY", 148.34, 0.45, 165.0, 600.0, 20.0, "FX:USDJPY"),
    seed!("usd-chf", "USD/CHF", "USDCHF", "USDCHF", 0.8790, -0.15, 130.0, 550.0, 12.0, "FX:USDCHF"),
    seed!("aud-usd", "AUD/USD", "AUDUSD", "AUDUSD", 0.6523, 0.34, 115.0, 500.0, 10.0, "FX:AUDUSD"),
    seed!("usd-cad", "USD/CAD", "USDCAD", "USDCAD", 1.3546, -0.28, 140.0, 600.0, 12.0, "FX:USDCAD"),
    seed!("nzd-usd", "NZD/USD", "NZDUSD", "NZDUSD", 0.6123, 0.67, 110.0, 500.0, 10.0, "FX:NZDUSD"),
    seed!("eur-gbp", "EUR/GBP", "EURGBP", "EURGBP", 0.8567, -0.12, 135.0, 600.0, 12.0, "FX:EURGBP"),
];

const COMMODITIES: &[Seed] = &[
    seed!("gold", "Gold Futures", "XAUUSD", "GOLD", 1987.45, 0.89, 160.0, 600.0, 20.0, "TVC:GOLD"),
    seed!("silver", "Silver Futures", "XAGUSD", "SILVER", 23.45, 1.23, 120.0, 500.0, 12.0, "TVC:SILVER"),
    seed!("oil", "Crude Oil", "USOIL", "OIL", 78.90, -1.45, 155.0, 600.0, 12.0, "TVC:USOIL"),
    seed!("natural-gas", "Natural Gas", "NGAS", "NATURALGAS", 2.89, 2.34, 105.0, 500.0, 10.0, "TVC:NATURALGAS"),
    seed!("copper", "Copper Futures", "COPPER", "COPPER", 3.78, -0.56, 125.0, 550.0, 12.0, "TVC:COPPER"),
];

// Equity feed keys are exchange tickers.
const EQUITIES: &[Seed] = &[
    seed!("apple", "Apple Inc", "AAPL", "AAPL", 189.45, 1.23, 165.0, 600.0, 20.0, "NASDAQ:AAPL"),
    seed!("tesla", "Tesla Inc", "TSLA", "TSLA", 245.67, -2.34, 150.0, 600.0, 12.0, "NASDAQ:TSLA"),
    seed!("amazon", "Amazon.com", "AMZN", "AMZN", 145.67, 0.89, 140.0, 600.0, 12.0, "NASDAQ:AMZN"),
    seed!("google", "Google LLC", "GOOGL", "GOOGL", 138.90, 1.45, 135.0, 550.0, 12.0, "NASDAQ:GOOGL"),
    seed!("microsoft", "Microsoft Corp", "MSFT", "MSFT", 378.45, 0.67, 160.0, 600.0, 20.0, "NASDAQ:MSFT"),
];

/// Immutable, ordered set of instruments shared by every component.
#[derive(Debug, Clone)]
pub struct Catalog {
    instruments: Vec<Instrument>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(instruments: Vec<Instrument>) -> Self {
        let index = instruments
            .iter()
            .enumerate()
            .map(|(position, instrument)| (instrument.id.clone(), position))
            .collect();
        Self { instruments, index }
    }

    /// The default set of crypto, forex, commodity and equity instruments.
    pub fn builtin() -> Self {
        let groups = [
            (AssetCategory::Crypto, CRYPTO),
            (AssetCategory::Forex, FOREX),
            (AssetCategory::Commodity, COMMODITIES),
            (AssetCategory::Equity, EQUITIES),
        ];
        let instruments = groups
            .iter()
            .flat_map(|(category, seeds)| {
                seeds.iter().map(move |seed| Instrument {
                    id: seed.id.to_string(),
                    name: seed.name.to_string(),
                    symbol: seed.symbol.to_string(),
                    category: *category,
                    feed_key: seed.feed_key.to_string(),
                    baseline_price: seed.price,
                    baseline_change_percent: seed.change,
                    min_investment: seed.min_investment,
                    hourly_income: seed.hourly_income,
                    duration_hours: seed.duration_hours,
                    chart_symbol: seed.chart_symbol.to_string(),
                })
            })
            .collect();
        Self::new(instruments)
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn get(&self, id: &str) -> Option<&Instrument> {
        self.index.get(id).map(|position| &self.instruments[*position])
    }

    pub fn by_category(&self, category: AssetCategory) -> impl Iterator<Item = &Instrument> {
        self.instruments
            .iter()
            .filter(move |instrument| instrument.category == category)
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_catalog_layout() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 28);
        assert_eq!(catalog.by_category(AssetCategory::Crypto).count(), 10);
        assert_eq!(catalog.by_category(AssetCategory::Forex).count(), 8);
        assert_eq!(catalog.by_category(AssetCategory::Commodity).count(), 5);
        assert_eq!(catalog.by_category(AssetCategory::Equity).count(), 5);

        let ids: HashSet<&str> = catalog.instruments().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids.len(), catalog.len(), "instrument ids must be unique");
    }

    #[test]
    fn test_lookup_by_id() {
        let catalog = Catalog::builtin();
        let bnb = catalog.get("binance-coin").unwrap();
        assert_eq!(bnb.feed_key, "binancecoin");
        assert_eq!(bnb.category, AssetCategory::Crypto);
        assert_eq!(
            bnb.chart_url(),
            "https://www.tradingview.com/chart/?symbol=BINANCE:BNBUSDT"
        );
        assert!(catalog.get("unknown").is_none());
    }
}
