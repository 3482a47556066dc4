use crate::models::PriceRecord;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

pub mod live_api;
pub mod portal;
pub mod synthetic;

/// Contract every price source implements. Sources are independent and never
/// call each other; the service owns the fallback ordering. An `Err` here is
/// equivalent to an empty result from the chain's point of view — the service
/// logs it and moves on to the next source.
#[async_trait]
pub trait MarketSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_prices(
        &self,
        commodity: &str,
        state: &str,
        date: NaiveDate,
    ) -> Result<Vec<PriceRecord>>;
}
