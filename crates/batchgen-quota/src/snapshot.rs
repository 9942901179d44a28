use chrono::{DateTime, Local};

/// Current quota status as reported by the remote service's rate-limit
/// headers.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QuotaSnapshot {
    pub requests_remaining: u64,
    pub requests_limit: u64,
    pub tokens_remaining: u64,
    pub tokens_limit: u64,
    pub reset_requests: String,
    pub reset_tokens: String,
    pub timestamp: DateTime<Local>,
}

impl QuotaSnapshot {
    pub fn requests_usage_percentage(&self) -> f64 {
        if self.requests_limit == 0 {
            return 0.0;
        }
        let used = self.requests_limit.saturating_sub(self.requests_remaining);
        (used as f64 / self.requests_limit as f64) * 100.0
    }

    pub fn tokens_usage_percentage(&self) -> f64 {
        if self.tokens_limit == 0 {
            return 0.0;
        }
        let used = self.tokens_limit.saturating_sub(self.tokens_remaining);
        (used as f64 / self.tokens_limit as f64) * 100.0
    }
}
