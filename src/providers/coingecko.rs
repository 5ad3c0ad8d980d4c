//! Crypto quotes from the CoinGecko markets endpoint.

use crate::core::asset::{AssetCategory, Instrument};
use crate::core::feed::{FeedAdapter, FeedMapping, FeedQuote};
use crate::providers::util::{RetryPolicy, get_text};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

pub struct CoinGeckoFeed {
    base_url: String,
    instruments: Vec<Instrument>,
    retry: RetryPolicy,
}

impl CoinGeckoFeed {
    pub fn new(base_url: &str, instruments: Vec<Instrument>) -> Self {
        CoinGeckoFeed {
            base_url: base_url.trim_end_matches('/').to_string(),
            instruments,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn markets_url(&self) -> String {
        let ids = self
            .instruments
            .iter()
            .map(|instrument| instrument.feed_key.as_str())
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{}/api/v3/coins/markets?vs_currency=usd&ids={}&order=market_cap_desc&per_page=100&page=1&sparkline=false&price_change_percentage=24h",
            self.base_url, ids
        )
    }
}

#[derive(Debug, Deserialize)]
struct CoinMarket {
    id: String,
    current_price: Option<f64>,
    price_change_percentage_24h: Option<f64>,
}

/// Coins without a price are left out so they fall back individually.
fn to_mapping(markets: Vec<CoinMarket>) -> FeedMapping {
    markets
        .into_iter()
        .filter_map(|coin| {
            let price = coin.current_price?;
            Some((
                coin.id,
                FeedQuote {
                    price,
                    change_percent: coin.price_change_percentage_24h.unwrap_or(0.0),
                },
            ))
        })
        .collect()
}

#[async_trait]
impl FeedAdapter for CoinGeckoFeed {
    fn category(&self) -> AssetCategory {
        AssetCategory::Crypto
    }

    fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    #[instrument(name = "CoinGeckoFetch", skip(self), fields(coins = self.instruments.len()))]
    async fn fetch_live(&self) -> Result<FeedMapping> {
        let url = self.markets_url();
        debug!("Requesting crypto markets from {}", url);

        let text = get_text(&url, self.retry, "crypto markets").await?;
        let markets: Vec<CoinMarket> = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for crypto markets: {}", e))?;

        debug!(received = markets.len(), "Received CoinGecko markets");
        Ok(to_mapping(markets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::Catalog;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn crypto() -> Vec<Instrument> {
        Catalog::builtin()
            .by_category(AssetCategory::Crypto)
            .cloned()
            .collect()
    }

    async fn mock_markets(status: u16, body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/coins/markets"))
            .and(query_param("vs_currency", "usd"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_live_markets_are_keyed_by_coin_id() {
        let body = r#"[
            {"id": "bitcoin", "current_price": 61234.5, "price_change_percentage_24h": -1.5},
            {"id": "binancecoin", "current_price": 580.1, "price_change_percentage_24h": null},
            {"id": "dogecoin", "current_price": null, "price_change_percentage_24h": 3.0}
        ]"#;
        let server = mock_markets(200, body).await;
        let feed = CoinGeckoFeed::new(&server.uri(), crypto()).with_retry(RetryPolicy::none());

        let live = feed.fetch_live().await.unwrap();
        assert_eq!(live.len(), 2);
        assert_eq!(
            live["bitcoin"],
            FeedQuote {
                price: 61234.5,
                change_percent: -1.5
            }
        );
        assert_eq!(live["binancecoin"].change_percent, 0.0);

        // Coins missing from the response or priced null fall back one by one.
        let mapping = feed.fetch().await;
        assert_eq!(mapping.len(), 10);
        assert_eq!(mapping["dogecoin"].price, 0.0789);
        assert_eq!(mapping["ethereum"].price, 3000.0);
        assert_eq!(mapping["bitcoin"].price, 61234.5);
    }

    #[tokio::test]
    async fn test_http_error_falls_back_to_baselines() {
        let server = mock_markets(500, "").await;
        let feed = CoinGeckoFeed::new(&server.uri(), crypto()).with_retry(RetryPolicy::none());

        let err = feed.fetch_live().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "HTTP error: 500 Internal Server Error for crypto markets"
        );

        let mapping = feed.fetch().await;
        for instrument in crypto() {
            assert_eq!(mapping[&instrument.feed_key], FeedQuote::baseline(&instrument));
        }
    }

    #[tokio::test]
    async fn test_malformed_response_is_an_error() {
        let server = mock_markets(200, r#"{"error": "rate limited"}"#).await;
        let feed = CoinGeckoFeed::new(&server.uri(), crypto()).with_retry(RetryPolicy::none());
        assert!(
            feed.fetch_live()
                .await
                .unwrap_err()
                .to_string()
                .contains("Failed to parse JSON response for crypto markets")
        );
    }

    #[test]
    fn test_markets_url_lists_every_coin() {
        let feed = CoinGeckoFeed::new("http://localhost/", crypto());
        let url = feed.markets_url();
        assert!(url.starts_with("http://localhost/api/v3/coins/markets?vs_currency=usd&ids=bitcoin,ethereum,"));
        assert!(url.contains("binancecoin"));
    }
}
