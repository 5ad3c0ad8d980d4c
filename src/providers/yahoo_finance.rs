use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::core::asset::{AssetCategory, Instrument};
use crate::core::currency::CurrencyRateProvider;
use crate::core::feed::{FeedAdapter, FeedMapping, FeedQuote};
use crate::providers::util::{RetryPolicy, get_text};

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Vec<ChartItem>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    meta: ChartMeta,
}

#[derive(Deserialize, Debug)]
struct ChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: f64,
    #[serde(alias = "chartPreviousClose")]
    previous_close: Option<f64>,
}

/// Fetches the chart metadata for one Yahoo symbol; `None` when Yahoo knows
/// the symbol but returns no result.
async fn fetch_chart_meta(
    base_url: &str,
    symbol: &str,
    retry: RetryPolicy,
) -> Result<Option<ChartMeta>> {
    let url = format!("{base_url}/v8/finance/chart/{symbol}");
    debug!("Requesting chart data from {}", url);

    let text = get_text(&url, retry, symbol).await?;
    let data: YahooChartResponse = serde_json::from_str(&text)
        .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", symbol, e))?;

    Ok(data.chart.result.into_iter().next().map(|item| item.meta))
}

fn percent_change(price: f64, previous_close: Option<f64>) -> f64 {
    match previous_close {
        Some(prev) if prev > 0.0 => ((price - prev) / prev) * 100.0,
        _ => 0.0,
    }
}

/// Live equity quotes, one chart request per ticker.
pub struct YahooQuoteFeed {
    base_url: String,
    instruments: Vec<Instrument>,
    retry: RetryPolicy,
}

impl YahooQuoteFeed {
    pub fn new(base_url: &str, instruments: Vec<Instrument>) -> Self {
        YahooQuoteFeed {
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

#[async_trait]
impl FeedAdapter for YahooQuoteFeed {
    fn category(&self) -> AssetCategory {
        AssetCategory::Equity
    }

    fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    #[instrument(name = "YahooQuoteFetch", skip(self), fields(tickers = self.instruments.len()))]
    async fn fetch_live(&self) -> Result<FeedMapping> {
        let requests = self.instruments.iter().map(|instrument| async move {
            let meta = fetch_chart_meta(&self.base_url, &instrument.feed_key, self.retry)
                .await
                .and_then(|meta| {
                    meta.ok_or_else(|| {
                        anyhow!("No chart data found for symbol: {}", instrument.feed_key)
                    })
                });
            (instrument, meta)
        });

        let mut mapping = FeedMapping::new();
        let mut last_error = None;
        for (instrument, meta) in join_all(requests).await {
            match meta {
                Ok(meta) => {
                    let quote = FeedQuote {
                        price: meta.regular_market_price,
                        change_percent: percent_change(
                            meta.regular_market_price,
                            meta.previous_close,
                        ),
                    };
                    mapping.insert(instrument.feed_key.clone(), quote);
                }
                Err(e) => {
                    warn!(symbol = %instrument.feed_key, error = %e, "Ticker fetch failed");
                    last_error = Some(e);
                }
            }
        }

        if mapping.is_empty()
            && let Some(e) = last_error
        {
            bail!("No equity quotes available: {}", e);
        }
        Ok(mapping)
    }
}

// YahooCurrencyProvider implementation for CurrencyRateProvider
pub struct YahooCurrencyProvider {
    base_url: String,
    retry: RetryPolicy,
}

impl YahooCurrencyProvider {
    pub fn new(base_url: &str) -> Self {
        YahooCurrencyProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl CurrencyRateProvider for YahooCurrencyProvider {
    #[instrument(name = "YahooRateFetch", skip(self))]
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64> {
        let symbol = format!("{from}{to}=X");
        let meta = fetch_chart_meta(&self.base_url, &symbol, self.retry)
            .await?
            .ok_or_else(|| anyhow!("No rate data found for currency pair: {}", symbol))?;
        Ok(meta.regular_market_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::Catalog;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_chart(server: &MockServer, symbol: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/v8/finance/chart/{symbol}")))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    fn equities() -> Vec<Instrument> {
        Catalog::builtin()
            .by_category(AssetCategory::Equity)
            .cloned()
            .collect()
    }

    #[tokio::test]
    async fn test_quote_feed_computes_daily_change() {
        let server = MockServer::start().await;
        mount_chart(
            &server,
            "AAPL",
            200,
            r#"{"chart": {"result": [{"meta": {"regularMarketPrice": 110.0, "chartPreviousClose": 100.0, "currency": "USD"}}]}}"#,
        )
        .await;
        mount_chart(
            &server,
            "MSFT",
            200,
            r#"{"chart": {"result": [{"meta": {"regularMarketPrice": 400.0}}]}}"#,
        )
        .await;

        let feed =
            YahooQuoteFeed::new(&server.uri(), equities()).with_retry(RetryPolicy::none());
        let mapping = feed.fetch().await;

        assert_eq!(mapping.len(), 5);
        assert_eq!(mapping["AAPL"].price, 110.0);
        assert!((mapping["AAPL"].change_percent - 10.0).abs() < 1e-9);
        assert_eq!(mapping["MSFT"].change_percent, 0.0);
        // Unmocked tickers answer 404 and fall back individually.
        assert_eq!(mapping["TSLA"].price, 245.67);
    }

    #[tokio::test]
    async fn test_quote_feed_fails_when_no_ticker_answers() {
        let server = MockServer::start().await;
        let feed =
            YahooQuoteFeed::new(&server.uri(), equities()).with_retry(RetryPolicy::none());
        let err = feed.fetch_live().await.unwrap_err();
        assert!(err.to_string().starts_with("No equity quotes available"));
        assert_eq!(feed.fetch().await, feed.fallback());
    }

    #[tokio::test]
    async fn test_successful_rate_fetch() {
        let mock_server = MockServer::start().await;
        let provider = YahooCurrencyProvider::new(&mock_server.uri())
            .with_retry(RetryPolicy::none());

        let mock_response = r#"{
            "chart": {
                "result": [
                    {
                        "meta": {
                            "regularMarketPrice": 129.5
                        }
                    }
                ]
            }
        }"#;
        mount_chart(&mock_server, "USDKES=X", 200, mock_response).await;

        let rate = provider
            .get_rate("USD", "KES")
            .await
            .expect("Failed to get rate");
        assert_eq!(rate, 129.5);
    }

    #[tokio::test]
    async fn test_no_currency_rate_found() {
        let mock_server = MockServer::start().await;
        let provider = YahooCurrencyProvider::new(&mock_server.uri())
            .with_retry(RetryPolicy::none());
        mount_chart(&mock_server, "USDEUR=X", 200, r#"{"chart": {"result": []}}"#).await;

        let result = provider.get_rate("USD", "EUR").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No rate data found for currency pair: USDEUR=X"
        );
    }

    #[tokio::test]
    async fn test_yahoo_currency_api_error_response() {
        let mock_server = MockServer::start().await;
        let provider = YahooCurrencyProvider::new(&mock_server.uri())
            .with_retry(RetryPolicy::none());
        mount_chart(&mock_server, "USDEUR=X", 500, "").await;

        let result = provider.get_rate("USD", "EUR").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 500 Internal Server Error for USDEUR=X"
        );
    }

    #[tokio::test]
    async fn test_yahoo_currency_api_malformed_response() {
        let mock_server = MockServer::start().await;
        let provider = YahooCurrencyProvider::new(&mock_server.uri())
            .with_retry(RetryPolicy::none());
        mount_chart(&mock_server, "USDEUR=X", 200, r#"{"chart": {"results": []}}"#).await;

        let result = provider.get_rate("USD", "EUR").await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse JSON response for USDEUR=X")
        );
    }
}
