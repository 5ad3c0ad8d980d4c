use super::ui;
use crate::core::asset::AssetState;
use crate::core::catalog::Catalog;
use crate::core::currency::CurrencyConverter;
use crate::core::income::{project, validate_investment};
use crate::core::investment::{InvestmentGateway, InvestmentRequest};
use crate::core::market::MarketState;
use anyhow::{Result, anyhow};
use comfy_table::Cell;
use std::sync::Arc;
use tracing::info;

/// Baseline state for one asset with economics in the display currency.
/// Income figures do not depend on live prices, so no feed is queried.
pub fn resolve_asset(converter: Arc<dyn CurrencyConverter>, asset_id: &str) -> Result<AssetState> {
    let mut state = MarketState::new(Arc::new(Catalog::builtin())).with_converter(converter);
    state.apply_conversion_only();
    state
        .asset(asset_id)
        .cloned()
        .ok_or_else(|| anyhow!("Unknown asset: {}", asset_id))
}

pub fn run(converter: Arc<dyn CurrencyConverter>, asset_id: &str, amount: &str) -> Result<()> {
    let currency = converter.currency().to_string();
    let asset = resolve_asset(converter, asset_id)?;
    let invested = validate_investment(&asset, amount)?;
    let projection = project(&asset, invested);

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Asset"),
        ui::header_cell("Invested"),
        ui::header_cell("Minimum"),
        ui::header_cell("Per hour"),
        ui::header_cell("Hours"),
        ui::header_cell("Total income"),
    ]);
    table.add_row(vec![
        Cell::new(&asset.name),
        ui::number_cell(ui::format_money(projection.invested, &currency)),
        ui::number_cell(ui::format_money(asset.min_investment, &currency)),
        ui::number_cell(format!("{:.4} {}", projection.hourly, currency)),
        ui::number_cell(format!("{}", asset.duration_hours)),
        ui::number_cell(ui::style_text(
            &ui::format_money(projection.total, &currency),
            ui::StyleType::TotalValue,
        )),
    ]);
    println!("{table}");
    Ok(())
}

/// Validates the amount locally, then places the purchase with the backend.
pub async fn invest(
    gateway: &dyn InvestmentGateway,
    converter: Arc<dyn CurrencyConverter>,
    asset_id: &str,
    amount: &str,
    phone_number: &str,
) -> Result<()> {
    let asset = resolve_asset(converter, asset_id)?;
    let amount = validate_investment(&asset, amount)?;
    let request = InvestmentRequest {
        asset_id: asset.instrument_id.clone(),
        amount,
        phone_number: phone_number.to_string(),
    };

    // Failures propagate to `main`, which logs them once.
    let receipt = gateway.buy(&request).await?;
    let message = receipt
        .message
        .unwrap_or_else(|| format!("Invested in {}", asset.name));
    info!(asset = %asset.instrument_id, amount, "Investment placed");
    println!("{}", ui::style_text(&message, ui::StyleType::TotalValue));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::RateConverter;
    use crate::core::investment::InvestmentReceipt;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingGateway {
        requests: Mutex<Vec<InvestmentRequest>>,
    }

    #[async_trait]
    impl InvestmentGateway for RecordingGateway {
        async fn buy(&self, request: &InvestmentRequest) -> Result<InvestmentReceipt> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(InvestmentReceipt {
                success: Some(true),
                message: None,
            })
        }
    }

    struct RejectingGateway;

    #[async_trait]
    impl InvestmentGateway for RejectingGateway {
        async fn buy(&self, _request: &InvestmentRequest) -> Result<InvestmentReceipt> {
            Err(anyhow!("Investment failed: Insufficient balance"))
        }
    }

    #[tokio::test]
    async fn test_invest_returns_gateway_error_unchanged() {
        let err = invest(
            &RejectingGateway,
            Arc::new(RateConverter::identity()),
            "gold",
            "600",
            "254700000000",
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Investment failed: Insufficient balance");
    }

    #[test]
    fn test_resolve_asset_converts_economics() {
        let converter = Arc::new(RateConverter::new("KES", 2.0).unwrap());
        let gold = resolve_asset(converter, "gold").unwrap();
        assert_eq!(gold.min_investment, 1200.0);
        assert_eq!(gold.hourly_income, 320.0);
        assert_eq!(gold.current_price, 1987.45);
        assert!(resolve_asset(Arc::new(RateConverter::identity()), "nope").is_err());
    }

    #[test]
    fn test_run_rejects_amount_below_minimum() {
        let err = run(Arc::new(RateConverter::identity()), "gold", "100").unwrap_err();
        assert_eq!(err.to_string(), "Minimum investment for Gold Futures is 600.00");
        assert!(run(Arc::new(RateConverter::identity()), "gold", "1200").is_ok());
    }

    #[tokio::test]
    async fn test_invest_sends_validated_request() {
        let gateway = RecordingGateway::default();
        invest(
            &gateway,
            Arc::new(RateConverter::identity()),
            "bitcoin",
            "750",
            "254700000000",
        )
        .await
        .unwrap();

        let requests = gateway.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].asset_id, "bitcoin");
        assert_eq!(requests[0].amount, 750.0);

        drop(requests);
        let rejected = invest(
            &gateway,
            Arc::new(RateConverter::identity()),
            "bitcoin",
            "10",
            "254700000000",
        )
        .await;
        assert!(rejected.is_err());
        assert_eq!(gateway.requests.lock().unwrap().len(), 1);
    }
}
