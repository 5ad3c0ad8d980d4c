//! Feed adapter abstraction and the fallback policy shared by every adapter.

use crate::core::asset::{AssetCategory, Instrument};
use anyhow::{Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, error, warn};

/// Raw price observation for one instrument, as produced by a feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedQuote {
    pub price: f64,
    pub change_percent: f64,
}

impl FeedQuote {
    pub fn baseline(instrument: &Instrument) -> Self {
        FeedQuote {
            price: instrument.baseline_price,
            change_percent: instrument.baseline_change_percent,
        }
    }
}

/// Quotes keyed by `Instrument::feed_key`.
pub type FeedMapping = HashMap<String, FeedQuote>;

/// Baseline quotes for every given instrument.
pub fn fallback_mapping(instruments: &[Instrument]) -> FeedMapping {
    instruments
        .iter()
        .map(|instrument| (instrument.feed_key.clone(), FeedQuote::baseline(instrument)))
        .collect()
}

/// One source of quotes for a single asset category.
///
/// Implementors only provide `fetch_live`, which may fail or return a partial
/// mapping. Callers use `fetch`, which never fails and always returns an entry
/// for every instrument of the category.
#[async_trait]
pub trait FeedAdapter: Send + Sync {
    fn category(&self) -> AssetCategory;

    /// Instruments this adapter is responsible for.
    fn instruments(&self) -> &[Instrument];

    async fn fetch_live(&self) -> Result<FeedMapping>;

    fn fallback(&self) -> FeedMapping {
        fallback_mapping(self.instruments())
    }

    async fn fetch(&self) -> FeedMapping {
        match self.fetch_live().await {
            Ok(mut mapping) => {
                for instrument in self.instruments() {
                    let usable = mapping
                        .get(&instrument.feed_key)
                        .is_some_and(|quote| quote.price.is_finite() && quote.price > 0.0);
                    if !usable {
                        debug!(
                            category = %self.category(),
                            key = %instrument.feed_key,
                            "Feed entry missing, using baseline"
                        );
                        mapping
                            .insert(instrument.feed_key.clone(), FeedQuote::baseline(instrument));
                    }
                }
                mapping
            }
            Err(e) => {
                warn!(
                    category = %self.category(),
                    error = %e,
                    "Feed failed, using fallback prices"
                );
                self.fallback()
            }
        }
    }
}

/// Output of every adapter for one refresh pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedBatch {
    feeds: HashMap<AssetCategory, FeedMapping>,
}

impl FeedBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: AssetCategory, mapping: FeedMapping) {
        self.feeds.insert(category, mapping);
    }

    pub fn quote(&self, instrument: &Instrument) -> Option<FeedQuote> {
        self.feeds
            .get(&instrument.category)
            .and_then(|mapping| mapping.get(&instrument.feed_key))
            .copied()
    }

    pub fn mapping(&self, category: AssetCategory) -> Option<&FeedMapping> {
        self.feeds.get(&category)
    }
}

/// Runs every adapter as its own task, each bounded by `deadline`.
///
/// An adapter that panics or misses the deadline is replaced by its fallback
/// mapping while the others keep their live quotes. Only when every adapter
/// fails is the pass reported as failed. Dropping the returned future aborts
/// any adapter task still running.
pub async fn fetch_all(
    adapters: &[Arc<dyn FeedAdapter>],
    deadline: Duration,
) -> Result<FeedBatch> {
    let mut tasks = JoinSet::new();
    let mut positions = HashMap::new();
    for (position, adapter) in adapters.iter().enumerate() {
        let adapter = Arc::clone(adapter);
        let handle = tasks.spawn(async move { timeout(deadline, adapter.fetch()).await });
        positions.insert(handle.id(), position);
    }

    let mut live: Vec<Option<FeedMapping>> = vec![None; adapters.len()];
    while let Some(joined) = tasks.join_next_with_id().await {
        let (id, mapping) = match joined {
            Ok((id, Ok(mapping))) => (id, Some(mapping)),
            Ok((id, Err(_))) => {
                if let Some(position) = positions.get(&id) {
                    warn!(
                        category = %adapters[*position].category(),
                        timeout = ?deadline,
                        "Feed adapter missed the refresh deadline"
                    );
                }
                (id, None)
            }
            Err(e) => {
                if let Some(position) = positions.get(&e.id()) {
                    error!(
                        category = %adapters[*position].category(),
                        error = %e,
                        "Feed adapter task failed"
                    );
                }
                (e.id(), None)
            }
        };
        if let Some(position) = positions.get(&id) {
            live[*position] = mapping;
        }
    }

    let mut batch = FeedBatch::new();
    let mut failures = 0;
    for (adapter, mapping) in adapters.iter().zip(live) {
        let mapping = mapping.unwrap_or_else(|| {
            failures += 1;
            adapter.fallback()
        });
        batch.insert(adapter.category(), mapping);
    }

    if !adapters.is_empty() && failures == adapters.len() {
        bail!("All {} feed adapters failed", failures);
    }
    Ok(batch)
}
