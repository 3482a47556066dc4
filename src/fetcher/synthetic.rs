use super::MarketSource;
use crate::models::PriceRecord;
use crate::registry::Registry;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Terminal fallback: generates plausible quotes from the registry's crop,
/// state and seasonal tables. No I/O, never fails. The RNG seed is derived
/// from (crop, state, date) so repeated calls within the same day produce
/// identical values instead of fresh noise.
pub struct SyntheticFetcher;

impl SyntheticFetcher {
    pub fn new() -> Self {
        Self
    }

    fn day_seed(commodity: &str, state: &str, date: NaiveDate) -> u64 {
        let mut hasher = DefaultHasher::new();
        commodity.trim().to_lowercase().hash(&mut hasher);
        state.trim().to_lowercase().hash(&mut hasher);
        date.hash(&mut hasher);
        hasher.finish()
    }

    fn generate(commodity: &str, state: &str, date: NaiveDate) -> Vec<PriceRecord> {
        let crop = Registry::crop_profile(commodity);
        let state_profile = Registry::state_profile(state);
        let seasonal = Registry::seasonal_factor(crop.category, date.month());

        let mut rng = StdRng::seed_from_u64(Self::day_seed(commodity, state, date));

        let mandi_count = state_profile.mandis.len().min(rng.gen_range(3..=5));
        let center = crop.base_price * state_profile.premium * seasonal;

        let mut prices = Vec::with_capacity(mandi_count);

        for mandi in state_profile.mandis.iter().take(mandi_count) {
            let wobble = rng.gen_range(-crop.variance..=crop.variance);
            let modal = (center * (1.0 + wobble)).max(1.0);
            let spread = modal * rng.gen_range(0.05..0.12);

            prices.push(PriceRecord::new(
                *mandi,
                state,
                *mandi,
                commodity,
                "Common",
                date,
                (modal - spread).max(0.0),
                modal + spread,
                modal,
            ));
        }

        prices
    }
}

impl Default for SyntheticFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketSource for SyntheticFetcher {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn fetch_prices(
        &self,
        commodity: &str,
        state: &str,
        date: NaiveDate,
    ) -> Result<Vec<PriceRecord>> {
        Ok(Self::generate(commodity, state, date))
    }
}
