use batchgen_quota::QuotaMonitor;
use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveTime};

const SUFFIX_MULTIPLIERS_SECONDS: [(&str, f64); 4] = [("ms", 0.001), ("s", 1.0), ("m", 60.0), ("h", 3600.0)];

/// Converts a quota reset hint (a duration like `"20ms"`/`"1.5s"`, a raw
/// number of seconds, an RFC3339 timestamp, or the literal `"unknown"`)
/// into an absolute resume time.
pub fn parse_reset_to_timestamp(reset_value: &str) -> Option<DateTime<Local>> {
    let reset_str = reset_value.trim();
    if reset_str.is_empty() || reset_str.eq_ignore_ascii_case("unknown") {
        return None;
    }

    let now = Local::now();

    for (suffix, multiplier) in SUFFIX_MULTIPLIERS_SECONDS {
        if let Some(amount_str) = reset_str.strip_suffix(suffix) {
            if let Ok(amount) = amount_str.parse::<f64>() {
                let seconds = amount * multiplier;
                if seconds >= 0.0 {
                    return ChronoDuration::try_milliseconds((seconds * 1000.0) as i64).map(|d| now + d);
                }
            }
        }
    }

    if let Ok(seconds) = reset_str.parse::<f64>() {
        if seconds >= 0.0 {
            return ChronoDuration::try_milliseconds((seconds * 1000.0) as i64).map(|d| now + d);
        }
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&reset_str.replace('Z', "+00:00")) {
        return Some(parsed.with_timezone(&Local));
    }

    None
}

fn next_local_midnight(now: DateTime<Local>) -> DateTime<Local> {
    let tomorrow = (now + ChronoDuration::days(1)).date_naive();
    tomorrow.and_time(NaiveTime::MIN).and_local_timezone(Local).single().unwrap_or(now + ChronoDuration::days(1))
}

/// Estimates when processing can resume based on the quota monitor's
/// latest status: a reset hint from the rate-limit headers if one parses,
/// otherwise the next local midnight when a daily limit is configured.
pub async fn estimate_resume_time(monitor: &QuotaMonitor) -> Option<DateTime<Local>> {
    if let Some(status) = monitor.current_status().await {
        for hint in [&status.reset_requests, &status.reset_tokens] {
            if let Some(resume_at) = parse_reset_to_timestamp(hint) {
                return Some(resume_at);
            }
        }
    }

    let metrics = monitor.current_metrics().await?;
    if metrics.daily_limit.is_some() {
        return Some(next_local_midnight(Local::now()));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_and_blank_yield_none() {
        assert!(parse_reset_to_timestamp("unknown").is_none());
        assert!(parse_reset_to_timestamp("").is_none());
        assert!(parse_reset_to_timestamp("Unknown").is_none());
    }

    #[test]
    fn duration_suffixes_parse_relative_to_now() {
        let now = Local::now();
        let resume_at = parse_reset_to_timestamp("500ms").unwrap();
        assert!(resume_at > now);
        assert!(resume_at < now + ChronoDuration::seconds(2));
    }

    #[test]
    fn raw_seconds_parse() {
        let now = Local::now();
        let resume_at = parse_reset_to_timestamp("30").unwrap();
        assert!(resume_at > now + ChronoDuration::seconds(20));
        assert!(resume_at < now + ChronoDuration::seconds(40));
    }

    #[test]
    fn rfc3339_timestamp_parses() {
        let resume_at = parse_reset_to_timestamp("2099-01-01T00:00:00Z").unwrap();
        assert_eq!(resume_at.format("%Y").to_string(), "2099");
    }

    #[test]
    fn garbage_is_none() {
        assert!(parse_reset_to_timestamp("not-a-time").is_none());
    }
}
