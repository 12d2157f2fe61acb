use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use super::headers::parse_retry_after;

/// Delay before a retry: the response's `Retry-After` wins over the action's static
/// `retryAfter`, and the result never exceeds `max_delay`.
pub fn retry_delay(
    static_seconds: Option<f64>,
    response_headers: Option<&BTreeMap<String, String>>,
    max_delay: Duration,
    now: SystemTime,
) -> Duration {
    let from_header = response_headers.and_then(|h| parse_retry_after(h, now));
    let delay = from_header
        .or_else(|| static_seconds.and_then(|s| Duration::try_from_secs_f64(s).ok()))
        .unwrap_or(Duration::ZERO);
    delay.min(max_delay)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_beats_static_value() {
        let mut headers = BTreeMap::new();
        headers.insert("Retry-After".to_string(), "2".to_string());
        let d = retry_delay(Some(10.0), Some(&headers), Duration::from_secs(60), SystemTime::now());
        assert_eq!(d, Duration::from_secs(2));
    }

    #[test]
    fn static_value_and_cap() {
        let d = retry_delay(Some(0.5), None, Duration::from_secs(60), SystemTime::now());
        assert_eq!(d, Duration::from_millis(500));
        let d = retry_delay(Some(600.0), None, Duration::from_secs(60), SystemTime::now());
        assert_eq!(d, Duration::from_secs(60));
        assert_eq!(
            retry_delay(None, None, Duration::from_secs(60), SystemTime::now()),
            Duration::ZERO
        );
    }
}
