//! Normalized line series over an instrument's price history.

use crate::core::asset::Trend;

/// Vertical share of the canvas kept free below the line.
const VERTICAL_PADDING: f64 = 0.1;

/// Vertical share of the canvas the price range is stretched over.
const VERTICAL_SCALE: f64 = 0.8;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub points: Vec<ChartPoint>,
    pub min: f64,
    pub max: f64,
    pub trend: Trend,
}

impl ChartSeries {
    /// Maps prices onto a `width` x `height` canvas with y growing downwards.
    /// Returns `None` for an empty history.
    pub fn from_history(history: &[f64], trend: Trend, width: f64, height: f64) -> Option<Self> {
        let (min, max) = bounds(history)?;
        let range = price_range(min, max);
        let last = history.len().saturating_sub(1);

        let points = history
            .iter()
            .enumerate()
            .map(|(index, price)| {
                let x = if last == 0 {
                    width
                } else {
                    index as f64 / last as f64 * width
                };
                let y = height
                    - ((price - min) / range) * height * VERTICAL_SCALE
                    - height * VERTICAL_PADDING;
                ChartPoint { x, y }
            })
            .collect();

        Some(Self {
            points,
            min,
            max,
            trend,
        })
    }

    /// Pairs of consecutive points; empty for a single sample.
    pub fn segments(&self) -> impl Iterator<Item = (ChartPoint, ChartPoint)> + '_ {
        self.points.windows(2).map(|pair| (pair[0], pair[1]))
    }

    /// Marker for the most recent price.
    pub fn current(&self) -> Option<ChartPoint> {
        self.points.last().copied()
    }
}

fn bounds(history: &[f64]) -> Option<(f64, f64)> {
    let first = *history.first()?;
    Some(
        history
            .iter()
            .fold((first, first), |(min, max), price| (min.min(*price), max.max(*price))),
    )
}

fn price_range(min: f64, max: f64) -> f64 {
    let range = max - min;
    if range > 0.0 { range } else { 1.0 }
}

/// One block character per price, scaled to the history's range.
pub fn sparkline(history: &[f64]) -> String {
    let Some((min, max)) = bounds(history) else {
        return String::new();
    };
    let range = price_range(min, max);
    let top = (SPARK_LEVELS.len() - 1) as f64;
    history
        .iter()
        .map(|price| {
            let level = (((price - min) / range) * top).round() as usize;
            SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}
