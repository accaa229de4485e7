//! Pure helpers: Link header and rate-limit header parsing (no HTTP).

use chrono::{DateTime, Duration, TimeZone, Utc};
use reqwest::header::{HeaderMap, RETRY_AFTER};

use crate::error::RateLimitKind;

/// Wait applied when GitHub signals a limit without saying for how long.
const DEFAULT_RATE_LIMIT_WAIT_SECS: i64 = 60;

/// Extract the `page` query parameter of the `rel="next"` link.
///
/// Format: `<https://api.github.com/...?page=2>; rel="next", <...>; rel="last"`
pub(crate) fn parse_next_page(link: &str) -> Option<u32> {
    link.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|p| p.trim() == r#"rel="next""#);
        if !is_next {
            return None;
        }

        let url = target.strip_prefix('<')?.strip_suffix('>')?;
        let url = reqwest::Url::parse(url).ok()?;
        url.query_pairs()
            .find(|(k, _)| k == "page")
            .and_then(|(_, v)| v.parse().ok())
    })
}

/// Classify a 403/429 response as a rate limit.
///
/// Mirrors GitHub's documented signals: an exhausted quota reports
/// `x-ratelimit-remaining: 0` with an epoch reset; secondary limits send
/// `retry-after` or mention "secondary rate limit" in the body.
pub(crate) fn classify_rate_limit(
    status: u16,
    headers: &HeaderMap,
    body: &str,
    now: DateTime<Utc>,
) -> Option<(RateLimitKind, DateTime<Utc>)> {
    if status != 403 && status != 429 {
        return None;
    }

    let reset_header = header_i64(headers, "x-ratelimit-reset")
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
    let fallback = now + Duration::seconds(DEFAULT_RATE_LIMIT_WAIT_SECS);

    if header_i64(headers, "x-ratelimit-remaining") == Some(0) {
        return Some((RateLimitKind::Primary, reset_header.unwrap_or(fallback)));
    }

    if let Some(secs) = header_i64(headers, RETRY_AFTER.as_str()) {
        return Some((RateLimitKind::Secondary, now + Duration::seconds(secs.max(0))));
    }

    let lowered = body.to_ascii_lowercase();
    if lowered.contains("secondary rate limit") || lowered.contains("abuse") || status == 429 {
        return Some((RateLimitKind::Secondary, reset_header.unwrap_or(fallback)));
    }

    None
}

fn header_i64(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Extract the `message` field of a GitHub error body, or a truncated body.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json.get("message")?.as_str().map(String::from))
        .unwrap_or_else(|| body.chars().take(200).collect())
}
