use crate::snapshot::QuotaSnapshot;

const DAILY_PAUSE_THRESHOLD_PERCENT: f64 = 80.0;
const IMMEDIATE_PAUSE_THRESHOLD_PERCENT: f64 = 95.0;

/// Calculated usage metrics and the pause decision they imply.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QuotaMetrics {
    pub requests_used_today: u64,
    pub daily_limit: Option<u64>,
    pub usage_percentage: f64,
    pub should_pause: bool,
    pub pause_reason: Option<String>,
}

impl QuotaMetrics {
    pub fn remaining_requests(&self) -> Option<u64> {
        self.daily_limit.map(|limit| limit.saturating_sub(self.requests_used_today))
    }
}

/// Computes [`QuotaMetrics`] from the latest header snapshot, the
/// configured daily limit (if any), and the day's running request count.
///
/// A daily limit takes priority for the reported usage percentage; absent
/// one, the immediate per-window rate-limit usage is used as a proxy.
/// Three independent conditions can trigger a pause: the daily limit
/// reaching 80%, or either the request or token rate-limit windows
/// reaching 95% — the higher bar for the immediate windows reflects that
/// they reset far sooner than a daily budget does.
pub fn calculate_usage_metrics(
    snapshot: &QuotaSnapshot,
    daily_limit: Option<u64>,
    requests_used_today: u64,
) -> QuotaMetrics {
    let usage_percentage = match daily_limit {
        Some(limit) if limit > 0 => (requests_used_today as f64 / limit as f64) * 100.0,
        _ => snapshot.requests_usage_percentage(),
    }
    .clamp(0.0, 110.0);

    let (should_pause, pause_reason) = if let Some(limit) = daily_limit.filter(|_| usage_percentage >= DAILY_PAUSE_THRESHOLD_PERCENT) {
        (true, Some(format!("Daily quota {usage_percentage:.1}% used (limit: {limit})")))
    } else if snapshot.requests_usage_percentage() >= IMMEDIATE_PAUSE_THRESHOLD_PERCENT {
        (true, Some(format!("Rate limit {:.1}% used", snapshot.requests_usage_percentage())))
    } else if snapshot.tokens_usage_percentage() >= IMMEDIATE_PAUSE_THRESHOLD_PERCENT {
        (true, Some(format!("Token limit {:.1}% used", snapshot.tokens_usage_percentage())))
    } else {
        (false, None)
    };

    QuotaMetrics {
        requests_used_today,
        daily_limit,
        usage_percentage,
        should_pause,
        pause_reason,
    }
}

/// Applies an operator-configured threshold on top of the metrics' own
/// pause decision — either one tripping is enough to pause.
pub fn should_pause_processing(metrics: &QuotaMetrics, threshold: f64) -> (bool, String) {
    if metrics.should_pause {
        return (true, metrics.pause_reason.clone().unwrap_or_else(|| "Quota threshold exceeded".to_string()));
    }

    let threshold_percent = threshold * 100.0;
    if metrics.usage_percentage >= threshold_percent {
        return (
            true,
            format!("Usage {:.1}% exceeds threshold {:.1}%", metrics.usage_percentage, threshold_percent),
        );
    }

    (false, "Within quota limits".to_string())
}
