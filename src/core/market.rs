//! Owned per-asset market state: asset records plus their price histories.
//!
//! `MarketState` is the single owner of every `AssetState` and
//! `HistoryBuffer`. It is mutated by refresh passes, simulation ticks and
//! currency changes, and hands out immutable `MarketSnapshot`s to readers.

use crate::core::asset::{AssetCategory, AssetState, CHANGE_PRECISION, Trend, round_to};
use crate::core::catalog::Catalog;
use crate::core::currency::{CurrencyConverter, RateConverter};
use crate::core::feed::{FeedBatch, FeedQuote};
use crate::core::history::{HISTORY_CAPACITY, HistoryBuffer};
use crate::core::synth::{Synthesized, convert_economics, synthesize, synthesize_one};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

/// Default half-width of the per-tick multiplicative perturbation (±0.05%).
pub const TICK_JITTER: f64 = 0.0005;

#[derive(Debug, Clone)]
struct Track {
    state: AssetState,
    /// Unrounded last price; ticks perturb this, not the rounded display price.
    last_price: f64,
    history: HistoryBuffer,
}

impl Track {
    fn record(&mut self, price: f64) {
        let previous = self.last_price;
        self.history.push(price);
        self.last_price = price;

        let category = self.state.category;
        self.state.current_price = category.round_price(price);
        if let Some(change) = self.history.change_percent() {
            self.state.change_percent = round_to(change, CHANGE_PRECISION);
        }
        if let Some(average) = self.history.moving_average() {
            self.state.moving_average = category.round_price(average);
        }
        self.state.trend = Trend::between(previous, price, self.state.trend);
    }
}

/// Read-only view of the market handed to rendering and income layers.
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    pub assets: BTreeMap<AssetCategory, Vec<AssetState>>,
    pub histories: HashMap<String, Vec<f64>>,
    pub last_update: Option<DateTime<Utc>>,
    pub currency: String,
    pub ticks: u64,
}

impl MarketSnapshot {
    pub fn category(&self, category: AssetCategory) -> &[AssetState] {
        self.assets
            .get(&category)
            .map(|assets| assets.as_slice())
            .unwrap_or(&[])
    }

    pub fn asset(&self, id: &str) -> Option<&AssetState> {
        self.assets
            .values()
            .flat_map(|assets| assets.iter())
            .find(|asset| asset.instrument_id == id)
    }

    pub fn history(&self, id: &str) -> Option<&[f64]> {
        self.histories.get(id).map(|prices| prices.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

pub struct MarketState {
    catalog: Arc<Catalog>,
    converter: Arc<dyn CurrencyConverter>,
    tracks: Vec<Track>,
    index: HashMap<String, usize>,
    history_capacity: usize,
    tick_jitter: f64,
    last_update: Option<DateTime<Utc>>,
    ticks: u64,
}

impl MarketState {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            converter: Arc::new(RateConverter::identity()),
            tracks: Vec::new(),
            index: HashMap::new(),
            history_capacity: HISTORY_CAPACITY,
            tick_jitter: TICK_JITTER,
            last_update: None,
            ticks: 0,
        }
    }

    pub fn with_converter(mut self, converter: Arc<dyn CurrencyConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn with_tick_jitter(mut self, jitter: f64) -> Self {
        self.tick_jitter = jitter.abs();
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity.max(1);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// True once at least one refresh or conversion pass has populated state.
    pub fn is_initialized(&self) -> bool {
        !self.tracks.is_empty()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    /// Replaces every asset state from a feed batch. Histories survive; an
    /// empty history is seeded with the new price.
    pub fn apply_refresh(&mut self, batch: &FeedBatch) {
        let synthesized = synthesize(&self.catalog, batch, self.converter.as_ref());
        self.install(synthesized);
        self.last_update = Some(Utc::now());
        info!(assets = self.tracks.len(), "Applied refresh pass");
    }

    /// Reapplies currency conversion to existing states. Before any
    /// successful pass this builds baseline states from the catalog instead.
    pub fn apply_conversion_only(&mut self) {
        if !self.is_initialized() {
            let converter = Arc::clone(&self.converter);
            let baseline: Vec<Synthesized> = self
                .catalog
                .instruments()
                .iter()
                .map(|instrument| {
                    synthesize_one(instrument, FeedQuote::baseline(instrument), converter.as_ref())
                })
                .collect();
            self.install(baseline);
            info!("Built baseline state from catalog");
            return;
        }
        self.reconvert();
    }

    /// Switches the display currency and re-derives monetary fields only.
    pub fn set_converter(&mut self, converter: Arc<dyn CurrencyConverter>) {
        debug!(currency = converter.currency(), "Switching display currency");
        self.converter = converter;
        self.reconvert();
    }

    /// Advances the simulation clock by one tick for every instrument.
    /// Does nothing until the first pass has populated state.
    pub fn tick<R: Rng>(&mut self, rng: &mut R) {
        if !self.is_initialized() {
            return;
        }
        let jitter = self.tick_jitter;
        for track in &mut self.tracks {
            let factor = if jitter > 0.0 {
                rng.random_range(-jitter..=jitter)
            } else {
                0.0
            };
            let price = track.last_price * (1.0 + factor);
            track.record(price);
        }
        self.ticks += 1;
    }

    /// Records an exact price for one instrument, as a tick would.
    pub fn record_price(&mut self, id: &str, price: f64) -> bool {
        match self.index.get(id) {
            Some(position) => {
                self.tracks[*position].record(price);
                true
            }
            None => false,
        }
    }

    pub fn asset(&self, id: &str) -> Option<&AssetState> {
        self.index.get(id).map(|position| &self.tracks[*position].state)
    }

    pub fn history(&self, id: &str) -> Option<&HistoryBuffer> {
        self.index.get(id).map(|position| &self.tracks[*position].history)
    }

    /// Asset states grouped by category, each group in catalog order.
    pub fn assets_by_category(&self) -> BTreeMap<AssetCategory, Vec<AssetState>> {
        let mut grouped: BTreeMap<AssetCategory, Vec<AssetState>> = BTreeMap::new();
        for track in &self.tracks {
            grouped
                .entry(track.state.category)
                .or_default()
                .push(track.state.clone());
        }
        grouped
    }

    pub fn snapshot(&self) -> MarketSnapshot {
        MarketSnapshot {
            assets: self.assets_by_category(),
            histories: self
                .tracks
                .iter()
                .map(|track| (track.state.instrument_id.clone(), track.history.to_vec()))
                .collect(),
            last_update: self.last_update,
            currency: self.converter.currency().to_string(),
            ticks: self.ticks,
        }
    }

    fn install(&mut self, synthesized: Vec<Synthesized>) {
        let mut previous: HashMap<String, HistoryBuffer> = self
            .tracks
            .drain(..)
            .map(|track| (track.state.instrument_id, track.history))
            .collect();

        self.index.clear();
        for (position, item) in synthesized.into_iter().enumerate() {
            let id = item.state.instrument_id.clone();
            let mut history = previous
                .remove(&id)
                .unwrap_or_else(|| HistoryBuffer::with_capacity(self.history_capacity));
            if history.is_empty() {
                history.push(item.raw_price);
            }
            self.index.insert(id, position);
            self.tracks.push(Track {
                state: item.state,
                last_price: item.raw_price,
                history,
            });
        }
    }

    fn reconvert(&mut self) {
        for track in &mut self.tracks {
            let Some(instrument) = self.catalog.get(&track.state.instrument_id) else {
                continue;
            };
            let economics = convert_economics(instrument, self.converter.as_ref());
            track.state.min_investment = economics.min_investment;
            track.state.hourly_income = economics.hourly_income;
        }
    }
}
