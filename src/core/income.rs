//! Proportional payout model for investments.

use crate::core::asset::AssetState;
use anyhow::{Result, bail};

/// Projected income for one invested amount, in the display currency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncomeProjection {
    pub invested: f64,
    pub hourly: f64,
    pub total: f64,
}

/// Total income over the asset's duration:
/// `hourly_income * duration_hours * (invested / min_investment)`.
///
/// Scales linearly for any positive amount; minimums are the caller's concern.
pub fn total_income(asset: &AssetState, invested: f64) -> f64 {
    hourly_income(asset, invested) * asset.duration_hours
}

pub fn hourly_income(asset: &AssetState, invested: f64) -> f64 {
    if asset.min_investment <= 0.0 {
        return 0.0;
    }
    asset.hourly_income * (invested / asset.min_investment)
}

pub fn project(asset: &AssetState, invested: f64) -> IncomeProjection {
    IncomeProjection {
        invested,
        hourly: hourly_income(asset, invested),
        total: total_income(asset, invested),
    }
}

/// Parses a user-entered amount and checks it against the asset's minimum.
pub fn validate_investment(asset: &AssetState, input: &str) -> Result<f64> {
    let amount: f64 = match input.trim().parse() {
        Ok(amount) => amount,
        Err(_) => bail!("Invalid investment amount: {:?}", input),
    };
    if !amount.is_finite() || amount <= 0.0 {
        bail!("Invalid investment amount: {:?}", input);
    }
    if amount < asset.min_investment {
        bail!(
            "Minimum investment for {} is {:.2}",
            asset.name,
            asset.min_investment
        );
    }
    Ok(amount)
}

/// Remembers the last projection so an unchanged display does not recompute.
#[derive(Debug, Default)]
pub struct IncomeCalculator {
    last: Option<(String, f64, f64, f64, IncomeProjection)>,
}

impl IncomeCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(&mut self, asset: &AssetState, invested: f64) -> IncomeProjection {
        if let Some((id, hourly, minimum, amount, projection)) = &self.last {
            if *id == asset.instrument_id
                && *hourly == asset.hourly_income
                && *minimum == asset.min_investment
                && *amount == invested
            {
                return *projection;
            }
        }
        let projection = project(asset, invested);
        self.last = Some((
            asset.instrument_id.clone(),
            asset.hourly_income,
            asset.min_investment,
            invested,
            projection,
        ));
        projection
    }
}
