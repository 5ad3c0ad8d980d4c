//! Merges feed quotes with catalog entries into canonical asset states.

use crate::core::asset::{
    AssetState, CHANGE_PRECISION, INCOME_PRECISION, Instrument, Trend, round_to,
};
use crate::core::catalog::Catalog;
use crate::core::currency::CurrencyConverter;
use crate::core::feed::{FeedBatch, FeedQuote};
use tracing::debug;

/// Weight of the change percent in the smoothing proxy used until real
/// history accumulates.
const SMOOTHING_FACTOR: f64 = 0.1;

/// One synthesized instrument: the rounded state plus the unrounded price it
/// was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesized {
    pub state: AssetState,
    pub raw_price: f64,
}

/// Monetary fields of an instrument in the display currency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Economics {
    pub min_investment: f64,
    pub hourly_income: f64,
}

/// Converts an instrument's USD economics. Always starts from the catalog
/// values so repeated conversions never compound.
pub fn convert_economics(instrument: &Instrument, converter: &dyn CurrencyConverter) -> Economics {
    Economics {
        min_investment: converter.convert(instrument.min_investment),
        hourly_income: round_to(converter.convert(instrument.hourly_income), INCOME_PRECISION),
    }
}

/// Builds the state for one instrument from a quote.
pub fn synthesize_one(
    instrument: &Instrument,
    quote: FeedQuote,
    converter: &dyn CurrencyConverter,
) -> Synthesized {
    let category = instrument.category;
    let change_percent = quote.change_percent;
    let moving_average = quote.price * (1.0 - (change_percent / 100.0) * SMOOTHING_FACTOR);
    let economics = convert_economics(instrument, converter);

    Synthesized {
        state: AssetState {
            instrument_id: instrument.id.clone(),
            name: instrument.name.clone(),
            symbol: instrument.symbol.clone(),
            category,
            current_price: category.round_price(quote.price),
            change_percent: round_to(change_percent, CHANGE_PRECISION),
            moving_average: category.round_price(moving_average),
            trend: Trend::from_change(change_percent),
            min_investment: economics.min_investment,
            hourly_income: economics.hourly_income,
            duration_hours: instrument.duration_hours,
            chart_url: instrument.chart_url(),
        },
        raw_price: quote.price,
    }
}

/// Synthesizes every catalog instrument, in catalog order.
///
/// An instrument missing from the batch is priced from its baseline.
pub fn synthesize(
    catalog: &Catalog,
    batch: &FeedBatch,
    converter: &dyn CurrencyConverter,
) -> Vec<Synthesized> {
    catalog
        .instruments()
        .iter()
        .map(|instrument| {
            let quote = batch.quote(instrument).unwrap_or_else(|| {
                debug!(id = %instrument.id, "No quote in batch, using baseline");
                FeedQuote::baseline(instrument)
            });
            synthesize_one(instrument, quote, converter)
        })
        .collect()
}
