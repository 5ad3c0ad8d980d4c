//! Forex quotes derived from Frankfurter's USD reference rates.

use crate::core::asset::{AssetCategory, Instrument};
use crate::core::currency::BASE_CURRENCY;
use crate::core::feed::{FeedAdapter, FeedMapping, FeedQuote};
use crate::providers::util::{RetryPolicy, get_text};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

pub struct ForexFeed {
    base_url: String,
    instruments: Vec<Instrument>,
    retry: RetryPolicy,
}

impl ForexFeed {
    pub fn new(base_url: &str, instruments: Vec<Instrument>) -> Self {
        ForexFeed {
            base_url: base_url.trim_end_matches('/').to_string(),
            instruments,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[derive(Debug, Deserialize)]
struct LatestRates {
    rates: HashMap<String, f64>,
}

/// Units of `currency` per USD.
fn usd_rate(rates: &HashMap<String, f64>, currency: &str) -> Option<f64> {
    if currency == BASE_CURRENCY {
        return Some(1.0);
    }
    rates.get(currency).copied().filter(|rate| *rate > 0.0)
}

/// Price of a `BASEQUOTE` pair: how many QUOTE one BASE buys.
fn pair_price(rates: &HashMap<String, f64>, pair: &str) -> Option<f64> {
    if pair.len() != 6 || !pair.is_ascii() {
        return None;
    }
    let (base, quote) = pair.split_at(3);
    Some(usd_rate(rates, quote)? / usd_rate(rates, base)?)
}

#[async_trait]
impl FeedAdapter for ForexFeed {
    fn category(&self) -> AssetCategory {
        AssetCategory::Forex
    }

    fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    #[instrument(name = "ForexFetch", skip(self))]
    async fn fetch_live(&self) -> Result<FeedMapping> {
        let url = format!("{}/latest?from={}", self.base_url, BASE_CURRENCY);
        debug!("Requesting forex rates from {}", url);

        let text = get_text(&url, self.retry, "forex rates").await?;
        let latest: LatestRates = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for forex rates: {}", e))?;

        // The endpoint publishes no daily change; pairs keep their baseline one.
        let mapping = self
            .instruments
            .iter()
            .filter_map(|instrument| {
                let price = pair_price(&latest.rates, &instrument.feed_key)?;
                Some((
                    instrument.feed_key.clone(),
                    FeedQuote {
                        price,
                        change_percent: instrument.baseline_change_percent,
                    },
                ))
            })
            .collect();
        Ok(mapping)
    }
}
