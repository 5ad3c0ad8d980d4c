//! Instrument reference data and the derived per-asset market state.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    Crypto,
    Forex,
    Commodity,
    Equity,
}

/// Decimal places used for prices and moving averages, per category.
const PRICE_PRECISION: [(AssetCategory, u32); 4] = [
    (AssetCategory::Crypto, 2),
    (AssetCategory::Forex, 4),
    (AssetCategory::Commodity, 2),
    (AssetCategory::Equity, 2),
];

/// Decimal places for percentage changes, regardless of category.
pub const CHANGE_PRECISION: u32 = 2;

/// Decimal places for converted hourly income.
pub const INCOME_PRECISION: u32 = 4;

impl AssetCategory {
    pub const ALL: [AssetCategory; 4] = [
        AssetCategory::Crypto,
        AssetCategory::Forex,
        AssetCategory::Commodity,
        AssetCategory::Equity,
    ];

    pub fn price_precision(&self) -> u32 {
        PRICE_PRECISION
            .iter()
            .find(|(category, _)| category == self)
            .map_or(2, |(_, decimals)| *decimals)
    }

    /// Rounds a USD price to this category's display precision.
    pub fn round_price(&self, price: f64) -> f64 {
        round_to(price, self.price_precision())
    }

    /// Returns display name and emoji for the category
    pub fn display_info(&self) -> (&'static str, &'static str) {
        match self {
            AssetCategory::Crypto => ("Crypto", "🪙"),
            AssetCategory::Forex => ("Forex", "💱"),
            AssetCategory::Commodity => ("Commodities", "🛢"),
            AssetCategory::Equity => ("Equities", "📈"),
        }
    }
}

impl Display for AssetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                AssetCategory::Crypto => "crypto",
                AssetCategory::Forex => "forex",
                AssetCategory::Commodity => "commodity",
                AssetCategory::Equity => "equity",
            }
        )
    }
}

impl FromStr for AssetCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "crypto" => Ok(AssetCategory::Crypto),
            "forex" | "fx" => Ok(AssetCategory::Forex),
            "commodity" | "commodities" | "futures" => Ok(AssetCategory::Commodity),
            "equity" | "equities" | "stock" | "stocks" => Ok(AssetCategory::Equity),
            _ => Err(anyhow!("Invalid asset category: {}", s)),
        }
    }
}

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

impl Trend {
    /// Trend implied by a percentage change; flat counts as up.
    pub fn from_change(change_percent: f64) -> Self {
        if change_percent >= 0.0 {
            Trend::Up
        } else {
            Trend::Down
        }
    }

    /// Trend between two consecutive prices. A tie keeps `previous`.
    pub fn between(before: f64, after: f64, previous: Trend) -> Self {
        if after > before {
            Trend::Up
        } else if after < before {
            Trend::Down
        } else {
            previous
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::Up => "▲",
            Trend::Down => "▼",
        }
    }
}

/// Static reference data for one tradable instrument. Prices and economics are USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub category: AssetCategory,
    /// Lookup key into the category's feed mapping.
    pub feed_key: String,
    pub baseline_price: f64,
    pub baseline_change_percent: f64,
    pub min_investment: f64,
    pub hourly_income: f64,
    pub duration_hours: f64,
    pub chart_symbol: String,
}

impl Instrument {
    pub fn chart_url(&self) -> String {
        format!(
            "https://www.tradingview.com/chart/?symbol={}",
            self.chart_symbol
        )
    }
}

/// The current derived market snapshot for one instrument.
///
/// `current_price`, `change_percent` and `moving_average` are always USD.
/// `min_investment` and `hourly_income` are in the display currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetState {
    pub instrument_id: String,
    pub name: String,
    pub symbol: String,
    pub category: AssetCategory,
    pub current_price: f64,
    pub change_percent: f64,
    pub moving_average: f64,
    pub trend: Trend,
    pub min_investment: f64,
    pub hourly_income: f64,
    pub duration_hours: f64,
    pub chart_url: String,
}
