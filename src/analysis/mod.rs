use crate::models::{TrendAnalytics, TrendDirection, TrendSnapshot};

/// Reduce an ordered snapshot history (most recent first) to analytics.
///
/// Direction and change compare only the two most recent snapshots — a
/// short-horizon delta, deliberately not a fitted regression. Fewer than 2
/// snapshots yields neutral analytics, never an error.
pub fn analyze(snapshots: &[TrendSnapshot]) -> TrendAnalytics {
    if snapshots.len() < 2 {
        let mut analytics = TrendAnalytics::empty();
        if let Some(only) = snapshots.first() {
            analytics.current_avg = only.avg_price;
        }
        return analytics;
    }

    let current = snapshots[0].avg_price;
    let previous = snapshots[1].avg_price;
    let change = current - previous;

    // Guard the division: a zero previous average reads as 0% change
    let change_percent = if previous > 0.0 {
        change / previous * 100.0
    } else {
        0.0
    };

    let direction = if change > 0.0 {
        TrendDirection::Up
    } else if change < 0.0 {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    };

    TrendAnalytics {
        current_avg: current,
        change,
        change_percent,
        direction,
        volatility: volatility(snapshots),
    }
}

/// Sample standard deviation of the snapshot averages.
pub fn volatility(snapshots: &[TrendSnapshot]) -> f64 {
    let n = snapshots.len();
    if n < 2 {
        return 0.0;
    }

    let sum: f64 = snapshots.iter().map(|s| s.avg_price).sum();
    let mean = sum / n as f64;

    let variance: f64 = snapshots
        .iter()
        .map(|s| {
            let diff = s.avg_price - mean;
            diff * diff
        })
        .sum::<f64>()
        / (n - 1) as f64;

    variance.sqrt()
}
