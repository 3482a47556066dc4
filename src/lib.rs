//! Mandi market data service: cached commodity price lookups with a
//! live-API -> portal-scrape -> synthetic fallback chain, short-horizon
//! trend analytics, concurrent multi-crop fetches and cross-region
//! comparison. Built to sit behind a dashboard layer — no public method
//! errors out; failures surface as empty results.

pub mod analysis;
pub mod config;
pub mod core;
pub mod fetcher;
pub mod models;
pub mod predictor;
pub mod registry;

pub use crate::config::ServiceConfig;
pub use crate::core::service::MarketDataService;
pub use crate::models::{
    PredictionFeatures, PriceRecord, RegionSummary, TrendAnalytics, TrendDirection, TrendResult,
    TrendSnapshot,
};
pub use crate::predictor::PricePredictor;
