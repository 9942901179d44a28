use std::collections::HashMap;

use chrono::Local;
use regex::Regex;
use tracing::warn;

use crate::snapshot::QuotaSnapshot;

const DEFAULT_REQUESTS_LIMIT: u64 = 5000;
const DEFAULT_TOKENS_LIMIT: u64 = 4_000_000;

/// Parses the remote service's rate-limit response headers into a
/// [`QuotaSnapshot`], falling back to conservative defaults for any header
/// that is missing or malformed rather than failing the whole request.
///
/// `total_tokens_used`, when available from the response body, refines
/// `tokens_remaining` beyond what the headers alone report.
pub fn parse_rate_limit_headers(
    headers: &HashMap<String, String>,
    total_tokens_used: Option<u64>,
) -> QuotaSnapshot {
    let requests_remaining = parse_header_u64(headers, "x-ratelimit-remaining-requests", 0);
    let requests_limit = parse_header_u64(headers, "x-ratelimit-limit-requests", DEFAULT_REQUESTS_LIMIT);
    let mut tokens_remaining = parse_header_u64(headers, "x-ratelimit-remaining-tokens", DEFAULT_TOKENS_LIMIT);
    let tokens_limit = parse_header_u64(headers, "x-ratelimit-limit-tokens", DEFAULT_TOKENS_LIMIT);

    if let Some(used) = total_tokens_used {
        if used > 0 && used <= tokens_remaining {
            tokens_remaining -= used;
        }
    }

    let reset_requests = parse_reset_header(headers, "x-ratelimit-reset-requests");
    let reset_tokens = parse_reset_header(headers, "x-ratelimit-reset-tokens");

    QuotaSnapshot {
        requests_remaining,
        requests_limit,
        tokens_remaining,
        tokens_limit,
        reset_requests,
        reset_tokens,
        timestamp: Local::now(),
    }
}

fn parse_header_u64(headers: &HashMap<String, String>, key: &str, default: u64) -> u64 {
    match headers.get(key) {
        None => default,
        Some(value) => value.parse::<i64>().map(|v| v.max(0) as u64).unwrap_or_else(|_| {
            warn!(key, value, "invalid integer in quota header");
            default
        }),
    }
}

fn parse_reset_header(headers: &HashMap<String, String>, key: &str) -> String {
    let value = match headers.get(key) {
        Some(v) => v,
        None => return "unknown".to_string(),
    };

    let duration_re = Regex::new(r"^\d+(ms|s|m|h)$").expect("static regex is valid");
    if duration_re.is_match(value) {
        return value.clone();
    }

    if let Ok(seconds) = value.parse::<f64>() {
        if seconds > 0.0 {
            return (seconds as i64).to_string();
        }
    }

    if chrono::DateTime::parse_from_rfc3339(&value.replace('Z', "+00:00")).is_ok() {
        return value.clone();
    }

    warn!(key, value, "unknown reset time format in quota header");
    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn missing_headers_use_safe_defaults() {
        let snapshot = parse_rate_limit_headers(&HashMap::new(), None);
        assert_eq!(snapshot.requests_remaining, 0);
        assert_eq!(snapshot.requests_limit, DEFAULT_REQUESTS_LIMIT);
        assert_eq!(snapshot.tokens_remaining, DEFAULT_TOKENS_LIMIT);
        assert_eq!(snapshot.reset_requests, "unknown");
    }

    #[test]
    fn parses_well_formed_headers() {
        let h = headers(&[
            ("x-ratelimit-remaining-requests", "42"),
            ("x-ratelimit-limit-requests", "100"),
            ("x-ratelimit-remaining-tokens", "900"),
            ("x-ratelimit-limit-tokens", "1000"),
            ("x-ratelimit-reset-requests", "20ms"),
            ("x-ratelimit-reset-tokens", "2.5"),
        ]);
        let snapshot = parse_rate_limit_headers(&h, None);
        assert_eq!(snapshot.requests_remaining, 42);
        assert_eq!(snapshot.requests_limit, 100);
        assert_eq!(snapshot.tokens_remaining, 900);
        assert_eq!(snapshot.reset_requests, "20ms");
        assert_eq!(snapshot.reset_tokens, "2");
    }

    #[test]
    fn body_usage_refines_remaining_tokens() {
        let h = headers(&[("x-ratelimit-remaining-tokens", "1000")]);
        let snapshot = parse_rate_limit_headers(&h, Some(300));
        assert_eq!(snapshot.tokens_remaining, 700);
    }

    #[test]
    fn garbage_usage_is_ignored() {
        let h = headers(&[("x-ratelimit-remaining-tokens", "1000")]);
        let snapshot = parse_rate_limit_headers(&h, Some(5000));
        assert_eq!(snapshot.tokens_remaining, 1000);
    }

    #[test]
    fn invalid_integer_header_falls_back_to_default() {
        let h = headers(&[("x-ratelimit-limit-requests", "not-a-number")]);
        let snapshot = parse_rate_limit_headers(&h, None);
        assert_eq!(snapshot.requests_limit, DEFAULT_REQUESTS_LIMIT);
    }

    #[test]
    fn unrecognized_reset_format_is_unknown() {
        let h = headers(&[("x-ratelimit-reset-requests", "not-a-time")]);
        let snapshot = parse_rate_limit_headers(&h, None);
        assert_eq!(snapshot.reset_requests, "unknown");
    }
}
