use crate::analysis;
use crate::config::ServiceConfig;
use crate::core::cache::{bucket_key, TtlCache};
use crate::core::rate_limiter::RateLimiter;
use crate::fetcher::live_api::LiveApiFetcher;
use crate::fetcher::portal::PortalFetcher;
use crate::fetcher::synthetic::SyntheticFetcher;
use crate::fetcher::MarketSource;
use crate::models::{PredictionFeatures, PriceRecord, RegionSummary, TrendResult, TrendSnapshot};
use crate::predictor::PricePredictor;
use crate::registry::Registry;
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::timeout;

/// Public surface of the market data subsystem: cached single-crop lookups,
/// trend history, concurrent multi-crop fan-out and cross-region comparison.
/// Cheap to clone — all state is behind `Arc`s, which is what lets the
/// fan-out hand copies to worker tasks.
#[derive(Clone)]
pub struct MarketDataService {
    sources: Vec<Arc<dyn MarketSource>>,
    price_cache: Arc<TtlCache<Vec<PriceRecord>>>,
    trend_cache: Arc<TtlCache<TrendResult>>,
    fetch_timeout: Duration,
    pool: Arc<Semaphore>,
    predictor: Arc<PricePredictor>,
}

impl MarketDataService {
    /// Builds the default source chain from configuration:
    /// live API (when a key is configured) -> portal (when a URL is
    /// configured) -> synthetic. The synthetic source is always present, so
    /// the chain has a terminal member that cannot fail.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        Registry::validate()?;

        let mut sources: Vec<Arc<dyn MarketSource>> = Vec::new();

        if let Some(key) = &config.api_key {
            sources.push(Arc::new(LiveApiFetcher::new(
                key.clone(),
                config.api_url.clone(),
            )));
        } else {
            println!("MarketData: no API key configured, live source disabled");
        }

        if let Some(url) = &config.portal_url {
            sources.push(Arc::new(PortalFetcher::new(url.clone())));
        }

        sources.push(Arc::new(SyntheticFetcher::new()));

        let names: Vec<&str> = sources.iter().map(|s| s.name()).collect();
        println!("MarketData: source chain = {:?}", names);

        Ok(Self::with_sources(sources, config))
    }

    /// Dependency-injected variant; tests hand in mock sources here.
    pub fn with_sources(sources: Vec<Arc<dyn MarketSource>>, config: &ServiceConfig) -> Self {
        Self {
            sources,
            price_cache: Arc::new(TtlCache::new(config.price_ttl, config.cache_capacity)),
            trend_cache: Arc::new(TtlCache::new(config.trend_ttl, config.cache_capacity)),
            fetch_timeout: config.fetch_timeout,
            pool: Arc::new(Semaphore::new(config.pool_limit.max(1))),
            predictor: Arc::new(PricePredictor::unavailable()),
        }
    }

    /// Attaches a pre-trained price model. Without one, `predict_price`
    /// reports unavailable.
    pub fn with_predictor(mut self, predictor: PricePredictor) -> Self {
        self.predictor = Arc::new(predictor);
        self
    }

    /// Today's prices for one (commodity, region) pair.
    /// An empty result means "no data available", not an error.
    pub async fn get_prices(&self, commodity: &str, region: &str) -> Vec<PriceRecord> {
        self.get_prices_on(commodity, region, Utc::now().date_naive())
            .await
    }

    /// Dated variant backing both today's lookups and trend history.
    pub async fn get_prices_on(
        &self,
        commodity: &str,
        region: &str,
        date: NaiveDate,
    ) -> Vec<PriceRecord> {
        let bucket = format!("{}{}", date.format("%Y%m%d"), Utc::now().format("%H"));
        let key = bucket_key("prices", commodity, region, &bucket);

        if let Some(cached) = self.price_cache.get(&key) {
            return cached;
        }

        let prices = self.run_chain(commodity, region, date).await;
        if !prices.is_empty() {
            self.price_cache.put(key, prices.clone());
        }
        prices
    }

    /// Runs the fallback chain in order, short-circuiting on the first
    /// source that produces records. Source errors are logged and swallowed
    /// here; nothing propagates past this point.
    async fn run_chain(&self, commodity: &str, region: &str, date: NaiveDate) -> Vec<PriceRecord> {
        for source in &self.sources {
            RateLimiter::wait(source.name()).await;

            match source.fetch_prices(commodity, region, date).await {
                Ok(prices) if !prices.is_empty() => {
                    println!(
                        "MarketData: {} returned {} records for {}/{}",
                        source.name(),
                        prices.len(),
                        commodity,
                        region
                    );
                    return prices;
                }
                Ok(_) => {
                    println!(
                        "MarketData: {} had no records for {}/{}, trying next source",
                        source.name(),
                        commodity,
                        region
                    );
                }
                Err(e) => {
                    eprintln!(
                        "MarketData: {} failed for {}/{}: {}",
                        source.name(),
                        commodity,
                        region,
                        e
                    );
                }
            }
        }

        Vec::new()
    }

    /// Daily snapshots for the last `days` days (most recent first) plus
    /// reduced analytics. Days without data are omitted from the snapshot
    /// list; fewer than 2 usable snapshots yields neutral analytics.
    pub async fn get_trends(&self, commodity: &str, region: &str, days: u32) -> TrendResult {
        let today = Utc::now().date_naive();
        let bucket = format!("{}:{}{}", days, today.format("%Y%m%d"), Utc::now().format("%H"));
        let key = bucket_key("trends", commodity, region, &bucket);

        if let Some(cached) = self.trend_cache.get(&key) {
            return cached;
        }

        let mut snapshots = Vec::new();

        for i in 0..days as i64 {
            let date = today - chrono::Duration::days(i);
            let prices = self.get_prices_on(commodity, region, date).await;
            if prices.is_empty() {
                continue;
            }

            let sum: f64 = prices.iter().map(|p| p.modal_price).sum();
            snapshots.push(TrendSnapshot {
                date,
                avg_price: sum / prices.len() as f64,
                record_count: prices.len(),
            });
        }

        let result = TrendResult {
            commodity: commodity.to_string(),
            region: region.to_string(),
            analytics: analysis::analyze(&snapshots),
            snapshots,
        };

        if !result.snapshots.is_empty() {
            self.trend_cache.put(key, result.clone());
        }
        result
    }

    /// Concurrent multi-crop lookup. Every requested commodity appears in
    /// the output; a commodity whose task fails or outlives the timeout maps
    /// to an empty list rather than delaying or failing the batch.
    pub async fn get_multi(
        &self,
        commodities: &[String],
        region: &str,
    ) -> HashMap<String, Vec<PriceRecord>> {
        let mut results: HashMap<String, Vec<PriceRecord>> = commodities
            .iter()
            .map(|c| (c.clone(), Vec::new()))
            .collect();

        let date = Utc::now().date_naive();
        let mut handles = Vec::with_capacity(commodities.len());

        for commodity in commodities {
            let svc = self.clone();
            let pool = Arc::clone(&self.pool);
            let commodity = commodity.clone();
            let region = region.to_string();
            let task_timeout = self.fetch_timeout;

            handles.push(tokio::spawn(async move {
                let fetched = timeout(task_timeout, async {
                    // Permit waits count toward the timeout so a saturated
                    // pool cannot stall the batch indefinitely
                    let _permit = pool.acquire().await.ok()?;
                    Some(svc.get_prices_on(&commodity, &region, date).await)
                })
                .await;

                match fetched {
                    Ok(Some(prices)) => (commodity, prices),
                    Ok(None) => (commodity, Vec::new()),
                    Err(_) => {
                        eprintln!("MarketData: fetch timed out for {}", commodity);
                        (commodity, Vec::new())
                    }
                }
            }));
        }

        for handle in handles {
            if let Ok((commodity, prices)) = handle.await {
                results.insert(commodity, prices);
            }
        }

        results
    }

    /// Cross-region summary for one commodity, sorted by average modal price
    /// descending. Regions with no data still appear, zeroed, so callers can
    /// render "no data" instead of silently dropping a requested region.
    pub async fn get_comparison(
        &self,
        commodity: &str,
        regions: &[String],
    ) -> Vec<RegionSummary> {
        let mut summaries = Vec::with_capacity(regions.len());

        for region in regions {
            let prices = self.get_prices(commodity, region).await;
            summaries.push(summarize_region(region, &prices));
        }

        summaries.sort_by(|a, b| {
            b.avg_price
                .partial_cmp(&a.avg_price)
                .unwrap_or(Ordering::Equal)
        });
        summaries
    }

    /// Model-based estimate for a feature tuple not directly observed.
    /// `None` means "prediction unavailable", which is distinct from a
    /// genuine zero estimate.
    pub fn predict_price(&self, features: &PredictionFeatures) -> Option<f64> {
        self.predictor.predict(features)
    }
}

fn summarize_region(region: &str, prices: &[PriceRecord]) -> RegionSummary {
    if prices.is_empty() {
        return RegionSummary::no_data(region);
    }

    let modals: Vec<f64> = prices.iter().map(|p| p.modal_price).collect();
    let sum: f64 = modals.iter().sum();
    let min = modals.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = modals.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    RegionSummary {
        region: region.to_string(),
        avg_price: sum / modals.len() as f64,
        min_price: min,
        max_price: max,
        mandi_count: prices.len(),
    }
}
