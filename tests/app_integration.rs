use std::fs;
use tracing::info;

// Adds automatic logging to test
mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn mount_get(server: &MockServer, url_path: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(url_path))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    pub fn write_config(file: &tempfile::NamedTempFile, content: &str) {
        std::fs::write(file.path(), content).expect("Failed to write config file");
    }
}

#[test_log::test(tokio::test)]
async fn test_snapshot_flow_with_mock_feeds() {
    let server = wiremock::MockServer::start().await;
    test_utils::mount_get(
        &server,
        "/api/v3/coins/markets",
        200,
        r#"[{"id": "bitcoin", "current_price": 61000.0, "price_change_percentage_24h": 1.5}]"#,
    )
    .await;
    test_utils::mount_get(
        &server,
        "/latest",
        200,
        r#"{"base": "USD", "rates": {"EUR": 0.9, "GBP": 0.8, "JPY": 150.0}}"#,
    )
    .await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_content = format!(
        r#"
        currency: "USD"
        providers:
          coingecko:
            base_url: {uri}
          frankfurter:
            base_url: {uri}
        schedule:
          refresh_timeout_secs: 10
    "#,
        uri = server.uri()
    );
    test_utils::write_config(&config_file, &config_content);

    let result = assetpulse::run_command(
        assetpulse::AppCommand::Snapshot { category: None },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Snapshot command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_engine_with_failing_crypto_feed_keeps_other_categories_live() {
    use assetpulse::core::catalog::Catalog;
    use assetpulse::core::config::ProvidersConfig;
    use assetpulse::core::engine::{EngineConfig, EngineHandle};
    use assetpulse::core::market::MarketState;
    use std::sync::Arc;
    use std::time::Duration;

    let server = wiremock::MockServer::start().await;
    test_utils::mount_get(&server, "/api/v3/coins/markets", 500, "").await;
    test_utils::mount_get(
        &server,
        "/latest",
        200,
        r#"{"base": "USD", "rates": {"EUR": 0.5}}"#,
    )
    .await;

    let mut providers = ProvidersConfig::default();
    providers.coingecko.base_url = server.uri();
    providers.frankfurter.base_url = server.uri();

    let catalog = Arc::new(Catalog::builtin());
    let adapters = assetpulse::providers::build_adapters(&providers, &catalog);
    let config = EngineConfig {
        refresh_interval: Duration::from_secs(3600),
        tick_interval: Duration::from_secs(3600),
        refresh_timeout: Duration::from_secs(10),
        queue_capacity: 8,
    };
    let engine = EngineHandle::start(MarketState::new(Arc::clone(&catalog)), adapters, config);

    let mut rx = engine.subscribe();
    let snapshot = tokio::time::timeout(
        Duration::from_secs(10),
        rx.wait_for(|snapshot| snapshot.last_update.is_some()),
    )
    .await
    .expect("first refresh timed out")
    .map(|snapshot| Arc::clone(&*snapshot))
    .expect("engine stopped");
    engine.shutdown().await;

    info!(ticks = snapshot.ticks, "Received first refreshed snapshot");
    for instrument in catalog.by_category(assetpulse::core::AssetCategory::Crypto) {
        let asset = snapshot.asset(&instrument.id).unwrap();
        assert_eq!(
            asset.current_price,
            instrument.category.round_price(instrument.baseline_price)
        );
        assert_eq!(asset.change_percent, instrument.baseline_change_percent);
        assert_eq!(
            snapshot.history(&instrument.id).unwrap(),
            &[instrument.baseline_price]
        );
    }
    assert_eq!(snapshot.asset("eur-usd").unwrap().current_price, 2.0);
}

#[test_log::test(tokio::test)]
async fn test_income_flow_in_display_currency() {
    let server = wiremock::MockServer::start().await;
    test_utils::mount_get(
        &server,
        "/v8/finance/chart/USDKES=X",
        200,
        r#"{"chart": {"result": [{"meta": {"regularMarketPrice": 129.5}}]}}"#,
    )
    .await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(
        &config_file,
        &format!(
            r#"
        currency: "KES"
        providers:
          yahoo:
            base_url: {}
    "#,
            server.uri()
        ),
    );

    // 600 USD minimum is 77700 KES.
    let config_path = config_file.path().to_str().unwrap();
    let below = assetpulse::run_command(
        assetpulse::AppCommand::Income {
            asset: "gold".to_string(),
            amount: "600".to_string(),
        },
        Some(config_path),
    )
    .await;
    assert_eq!(
        below.unwrap_err().to_string(),
        "Minimum investment for Gold Futures is 77700.00"
    );

    let result = assetpulse::run_command(
        assetpulse::AppCommand::Income {
            asset: "gold".to_string(),
            amount: "80000".to_string(),
        },
        Some(config_path),
    )
    .await;
    assert!(result.is_ok(), "Income command failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_invest_flow_with_mock_backend() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    let server = wiremock::MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/investments/buy"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"success": true, "message": "ok"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(
        &config_file,
        &format!("backend:\n  base_url: {}\n", server.uri()),
    );

    let result = assetpulse::run_command(
        assetpulse::AppCommand::Invest {
            asset: "apple".to_string(),
            amount: "600".to_string(),
            phone: "254700000000".to_string(),
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(result.is_ok(), "Invest command failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_missing_config_file_is_an_error() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let missing = temp_dir.path().join("absent.yaml");
    assert!(!missing.exists());

    let result = assetpulse::run_command(
        assetpulse::AppCommand::Snapshot { category: None },
        Some(missing.to_str().unwrap()),
    )
    .await;
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("Failed to read config file")
    );
    assert!(fs::metadata(&missing).is_err());
}
