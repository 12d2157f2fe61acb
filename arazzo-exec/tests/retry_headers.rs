use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use arazzo_exec::retry::parse_retry_after;

#[test]
fn parse_retry_after_delta_seconds() {
    let mut headers = BTreeMap::new();
    headers.insert("Retry-After".to_string(), "5".to_string());

    let result = parse_retry_after(&headers, SystemTime::now());
    assert_eq!(result, Some(Duration::from_secs(5)));
}

#[test]
fn parse_retry_after_http_date() {
    let mut headers = BTreeMap::new();
    let now = SystemTime::now();
    let future = now + Duration::from_secs(10);
    headers.insert("Retry-After".to_string(), httpdate::fmt_http_date(future));

    let delay = parse_retry_after(&headers, now).unwrap();
    assert!(delay.as_secs() >= 9 && delay.as_secs() <= 10);
}

#[test]
fn parse_retry_after_past_date_is_zero() {
    let mut headers = BTreeMap::new();
    let now = SystemTime::now();
    headers.insert(
        "Retry-After".to_string(),
        httpdate::fmt_http_date(now - Duration::from_secs(30)),
    );
    assert_eq!(parse_retry_after(&headers, now), Some(Duration::ZERO));
}

#[test]
fn parse_retry_after_case_insensitive() {
    let mut headers = BTreeMap::new();
    headers.insert("retry-after".to_string(), "3".to_string());

    assert_eq!(
        parse_retry_after(&headers, SystemTime::now()),
        Some(Duration::from_secs(3))
    );
}

#[test]
fn parse_retry_after_missing_or_garbage() {
    let mut headers = BTreeMap::new();
    assert_eq!(parse_retry_after(&headers, SystemTime::now()), None);
    headers.insert("Retry-After".to_string(), "soon".to_string());
    assert_eq!(parse_retry_after(&headers, SystemTime::now()), None);
}
