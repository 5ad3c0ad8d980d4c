//! Core market model: catalog, feeds, synthesis and the engine that drives them.

pub mod asset;
pub mod catalog;
pub mod chart;
pub mod config;
pub mod currency;
pub mod engine;
pub mod feed;
pub mod history;
pub mod income;
pub mod investment;
pub mod log;
pub mod market;
pub mod synth;

// Re-export main types for cleaner imports
pub use asset::{AssetCategory, AssetState, Instrument, Trend};
pub use catalog::Catalog;
pub use currency::{CurrencyConverter, CurrencyRateProvider, RateConverter};
pub use engine::{EngineConfig, EngineHandle};
pub use feed::{FeedAdapter, FeedBatch, FeedMapping, FeedQuote};
pub use investment::{InvestmentGateway, InvestmentReceipt, InvestmentRequest};
pub use market::{MarketSnapshot, MarketState};
