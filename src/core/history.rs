use std::collections::VecDeque;
use std::collections::vec_deque::Iter;

/// Number of prices retained per instrument.
pub const HISTORY_CAPACITY: usize = 50;

/// Number of trailing samples averaged into the moving average.
pub const MOVING_AVERAGE_WINDOW: usize = 5;

/// Bounded, insertion-ordered price history for one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryBuffer {
    prices: VecDeque<f64>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            prices: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Appends a price, evicting the oldest one once over capacity.
    pub fn push(&mut self, price: f64) {
        self.prices.push_back(price);
        while self.prices.len() > self.capacity {
            self.prices.pop_front();
        }
    }

    /// Oldest retained price; the baseline for percentage change.
    pub fn epoch(&self) -> Option<f64> {
        self.prices.front().copied()
    }

    pub fn latest(&self) -> Option<f64> {
        self.prices.back().copied()
    }

    /// Percentage change of the latest price against the epoch price.
    pub fn change_percent(&self) -> Option<f64> {
        let epoch = self.epoch()?;
        let latest = self.latest()?;
        if epoch == 0.0 {
            return None;
        }
        Some((latest - epoch) / epoch * 100.0)
    }

    /// Mean of the last `MOVING_AVERAGE_WINDOW` (or fewer) prices.
    pub fn moving_average(&self) -> Option<f64> {
        if self.prices.is_empty() {
            return None;
        }
        let window = self.prices.len().min(MOVING_AVERAGE_WINDOW);
        let sum: f64 = self.prices.iter().rev().take(window).sum();
        Some(sum / window as f64)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, f64> {
        self.prices.iter()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.prices.iter().copied().collect()
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}
