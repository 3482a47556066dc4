use std::env;
use std::time::Duration;

/// Runtime configuration for the market data service.
/// Everything arrives through the constructor — no module-level globals.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// data.gov.in style API key. Without it the live fetcher is skipped.
    pub api_key: Option<String>,
    pub api_url: String,
    /// Mandi report portal base URL. Without it the portal fetcher is
    /// omitted from the chain entirely (headless/server deployments).
    pub portal_url: Option<String>,
    /// TTL for cached price lookups.
    pub price_ttl: Duration,
    /// TTL for cached trend results.
    pub trend_ttl: Duration,
    /// Per-commodity task timeout inside `get_multi`.
    pub fetch_timeout: Duration,
    /// Concurrent worker bound for the multi-crop fan-out.
    /// Kept small so we do not hammer a rate-limited public API.
    pub pool_limit: usize,
    /// Soft bound on cache entries before expired ones are swept.
    pub cache_capacity: usize,
}

const DEFAULT_API_URL: &str =
    "https://api.data.gov.in/resource/9ef84268-d588-465a-a308-a864a43d0070";

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            portal_url: None,
            price_ttl: Duration::from_secs(3600),
            trend_ttl: Duration::from_secs(1800),
            fetch_timeout: Duration::from_secs(30),
            pool_limit: 3,
            cache_capacity: 512,
        }
    }
}

impl ServiceConfig {
    /// Reads overrides from the environment (and a `.env` file if present).
    pub fn from_env() -> Self {
        // Ignore a missing .env file; plain env vars still apply.
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(key) = env::var("MANDI_API_KEY") {
            if !key.trim().is_empty() {
                config.api_key = Some(key.trim().to_string());
            }
        }
        if let Ok(url) = env::var("MANDI_API_URL") {
            if !url.trim().is_empty() {
                config.api_url = url.trim().to_string();
            }
        }
        if let Ok(url) = env::var("MANDI_PORTAL_URL") {
            if !url.trim().is_empty() {
                config.portal_url = Some(url.trim().to_string());
            }
        }
        if let Some(secs) = read_u64("MANDI_PRICE_TTL_SECS") {
            config.price_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = read_u64("MANDI_TREND_TTL_SECS") {
            config.trend_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = read_u64("MANDI_FETCH_TIMEOUT_SECS") {
            config.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(n) = read_u64("MANDI_POOL_LIMIT") {
            if n > 0 {
                config.pool_limit = n as usize;
            }
        }

        config
    }
}

fn read_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|v| v.trim().parse::<u64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = ServiceConfig::default();
        assert_eq!(c.price_ttl, Duration::from_secs(3600));
        assert_eq!(c.trend_ttl, Duration::from_secs(1800));
        assert_eq!(c.pool_limit, 3);
        assert!(c.api_key.is_none());
        assert!(c.portal_url.is_none());
    }
}
