use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One mandi's price quote for one commodity on one date.
/// Constructed by a fetcher, immutable afterwards.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PriceRecord {
    pub market: String,
    pub state: String,
    pub district: String,
    pub commodity: String,
    pub variety: String,
    pub arrival_date: NaiveDate,
    /// Prices are rupees per quintal.
    pub min_price: f64,
    pub max_price: f64,
    pub modal_price: f64,
    pub unit: String,
}

impl PriceRecord {
    /// Builds a record while enforcing `min <= modal <= max`.
    /// Sources that report an inverted min/max get them swapped, and a modal
    /// price outside the band is clamped into it.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        market: impl Into<String>,
        state: impl Into<String>,
        district: impl Into<String>,
        commodity: impl Into<String>,
        variety: impl Into<String>,
        arrival_date: NaiveDate,
        min_price: f64,
        max_price: f64,
        modal_price: f64,
    ) -> Self {
        let (lo, hi) = if min_price <= max_price {
            (min_price, max_price)
        } else {
            (max_price, min_price)
        };
        let modal = modal_price.clamp(lo, hi);

        Self {
            market: market.into(),
            state: state.into(),
            district: district.into(),
            commodity: commodity.into(),
            variety: variety.into(),
            arrival_date,
            min_price: lo,
            max_price: hi,
            modal_price: modal,
            unit: "Quintal".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

/// One day's aggregated price point for a (commodity, region) pair.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TrendSnapshot {
    pub date: NaiveDate,
    /// Arithmetic mean of modal prices across that day's records.
    pub avg_price: f64,
    pub record_count: usize,
}

/// Derived analytics over a short snapshot history.
/// Change figures compare the two most recent snapshots only — a short-horizon
/// delta, not a fitted trend line.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TrendAnalytics {
    pub current_avg: f64,
    pub change: f64,
    pub change_percent: f64,
    pub direction: TrendDirection,
    /// Sample standard deviation of the daily averages.
    pub volatility: f64,
}

impl TrendAnalytics {
    /// Neutral analytics for when fewer than 2 snapshots carry data.
    pub fn empty() -> Self {
        Self {
            current_avg: 0.0,
            change: 0.0,
            change_percent: 0.0,
            direction: TrendDirection::Stable,
            volatility: 0.0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TrendResult {
    pub commodity: String,
    pub region: String,
    /// Most recent first.
    pub snapshots: Vec<TrendSnapshot>,
    pub analytics: TrendAnalytics,
}

/// Per-region price summary used by cross-region comparison.
/// Regions with no data keep zeroed fields rather than being dropped.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RegionSummary {
    pub region: String,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub mandi_count: usize,
}

impl RegionSummary {
    pub fn no_data(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            avg_price: 0.0,
            min_price: 0.0,
            max_price: 0.0,
            mandi_count: 0,
        }
    }
}

/// Categorical feature tuple for the price predictor.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PredictionFeatures {
    pub state: String,
    pub district: String,
    pub market: String,
    pub commodity: String,
    pub variety: String,
    pub grade: String,
}
