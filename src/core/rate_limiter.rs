use std::time::Duration;
use tokio::time::sleep;
use rand::Rng;

pub struct RateLimiter;

impl RateLimiter {
    /// Wait appropriate duration before hitting the given source.
    /// Jitter keeps repeated dashboard refreshes from landing in bursts on
    /// the public endpoints.
    pub async fn wait(source: &str) {
        match source {
            "live_api" => {
                let delay = {
                    let mut rng = rand::thread_rng();
                    rng.gen_range(200..600)
                };
                sleep(Duration::from_millis(delay)).await;
            }
            "portal" => {
                // Report portals are slow and grumpy; back off harder
                let delay = {
                    let mut rng = rand::thread_rng();
                    rng.gen_range(800..1500)
                };
                sleep(Duration::from_millis(delay)).await;
            }
            // Synthetic and anything local costs nothing
            _ => {}
        }
    }
}
