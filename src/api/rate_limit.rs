//! Rate-limit header parsing and 429 backoff
//!
//! The AppView reports its budget through `ratelimit-*` headers on every
//! response. The latest values are kept in a process-wide snapshot for
//! observability; nothing throttles on them. When a request is rejected with
//! 429 the wait before retrying is computed by [`compute_backoff`].

use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;

pub const RATELIMIT_LIMIT: &str = "ratelimit-limit";
pub const RATELIMIT_REMAINING: &str = "ratelimit-remaining";
pub const RATELIMIT_RESET: &str = "ratelimit-reset";
pub const RATELIMIT_POLICY: &str = "ratelimit-policy";

static LATEST: Mutex<Option<RateLimitSnapshot>> = Mutex::new(None);

/// Rate-limit state reported by the server on one response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitSnapshot {
    pub limit: Option<u64>,
    pub remaining: Option<u64>,
    pub reset: Option<DateTime<Utc>>,
    pub policy: Option<String>,
}

impl RateLimitSnapshot {
    /// Parses the `ratelimit-*` headers
    ///
    /// Returns `None` when the response carries none of them.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let snapshot = Self {
            limit: header_u64(headers, RATELIMIT_LIMIT),
            remaining: header_u64(headers, RATELIMIT_REMAINING),
            reset: header_i64(headers, RATELIMIT_RESET)
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
            policy: header_str(headers, RATELIMIT_POLICY).map(str::to_string),
        };

        if snapshot.limit.is_none()
            && snapshot.remaining.is_none()
            && snapshot.reset.is_none()
            && snapshot.policy.is_none()
        {
            None
        } else {
            Some(snapshot)
        }
    }
}

/// Stores the snapshot as the latest known state (last write wins)
pub fn record_snapshot(snapshot: RateLimitSnapshot) {
    if let Ok(mut latest) = LATEST.lock() {
        *latest = Some(snapshot);
    }
}

/// Returns the most recently observed rate-limit state
pub fn latest_rate_limit() -> Option<RateLimitSnapshot> {
    LATEST.lock().ok().and_then(|latest| latest.clone())
}

/// Computes how long to wait before retrying a 429 response
///
/// Precedence:
/// 1. `retry-after`, as delta-seconds or an HTTP-date
/// 2. `ratelimit-reset` (unix seconds), when it lies in the future
/// 3. `base * 2^attempt`
///
/// `attempt` is zero for the first retry.
pub fn compute_backoff(
    attempt: u32,
    headers: &HeaderMap,
    now: DateTime<Utc>,
    base: Duration,
) -> Duration {
    server_wait(headers, now).unwrap_or_else(|| exponential(attempt, base))
}

/// Wait demanded by the server through `retry-after` or `ratelimit-reset`
///
/// `None` when neither header yields a usable wait.
pub fn server_wait(headers: &HeaderMap, now: DateTime<Utc>) -> Option<Duration> {
    if let Some(wait) = header_str(headers, RETRY_AFTER.as_str()).and_then(|v| retry_after(v, now)) {
        return Some(wait);
    }

    header_i64(headers, RATELIMIT_RESET)
        .and_then(|reset| reset.checked_sub(now.timestamp()))
        .filter(|secs| *secs > 0)
        .map(|secs| Duration::from_secs(secs as u64))
}

fn retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    if let Ok(secs) = value.trim().parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let at = DateTime::parse_from_rfc2822(value.trim()).ok()?;
    let delta = at.with_timezone(&Utc) - now;
    Some(delta.to_std().unwrap_or(Duration::ZERO))
}

fn exponential(attempt: u32, base: Duration) -> Duration {
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    header_str(headers, name).and_then(|v| v.trim().parse().ok())
}

fn header_i64(headers: &HeaderMap, name: &str) -> Option<i64> {
    header_str(headers, name).and_then(|v| v.trim().parse().ok())
}
