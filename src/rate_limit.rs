use serde::{Deserialize, Serialize};

use crate::cache::Cache;

/// Token-bucket state as stored under `rate_limit:<policy>:<identifier>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BucketState {
    tokens: f64,
    last_refill_epoch_ms: f64,
    capacity: f64,
    refill_rate: f64,
}

/// Predefined policies. `(capacity, refill_rate tokens/sec)`.
pub fn policy_params(policy: &str) -> (f64, f64) {
    match policy {
        "public_api" => (100.0, 1.0),
        "auth" => (10.0, 0.1),
        "match_request" => (5.0, 0.05),
        "email" => (3.0, 0.01),
        "challenge_submit" => (20.0, 0.2),
        "chat" => (1.0, 2.0),
        _ => (100.0, 1.0),
    }
}

/// Information about rate limit status for a given key.
#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    pub allowed: bool,
    pub limit: usize,
    pub remaining: usize,
    /// Seconds until enough tokens have refilled for another request.
    /// 0 if there's remaining capacity.
    pub retry_after_secs: u64,
}

/// Attempt to consume `tokens` from the named policy's bucket for
/// `identifier`. Refill formula: `tokens = min(capacity, tokens + (now -
/// last_refill) * refill_rate)`, then deduct if enough are available.
///
/// On cache outage (the cache read/write itself erroring is invisible behind
/// the `Cache` trait, so "outage" here means the in-process fallback is the
/// only thing answering) this still behaves correctly; true fail-open only
/// applies if a future backend surfaces hard errors instead of silently
/// falling back, which is why this function has no fallible return path.
pub async fn consume(cache: &dyn Cache, policy: &str, identifier: &str, tokens: f64) -> RateLimitInfo {
    let (capacity, refill_rate) = policy_params(policy);
    let key = format!("rate_limit:{policy}:{identifier}");
    let ttl_secs = (capacity / refill_rate + 60.0) as u64;

    let now_ms = now_epoch_millis();

    let mut state = match cache.get(&key).await {
        Some(raw) => serde_json::from_str::<BucketState>(&raw).unwrap_or(BucketState {
            tokens: capacity,
            last_refill_epoch_ms: now_ms,
            capacity,
            refill_rate,
        }),
        None => BucketState {
            tokens: capacity,
            last_refill_epoch_ms: now_ms,
            capacity,
            refill_rate,
        },
    };

    let elapsed_secs = ((now_ms - state.last_refill_epoch_ms) / 1000.0).max(0.0);
    state.tokens = (state.tokens + elapsed_secs * refill_rate).min(capacity);
    state.last_refill_epoch_ms = now_ms;

    let info = if state.tokens >= tokens {
        state.tokens -= tokens;
        RateLimitInfo {
            allowed: true,
            limit: capacity as usize,
            remaining: state.tokens.floor() as usize,
            retry_after_secs: 0,
        }
    } else {
        let deficit = tokens - state.tokens;
        let retry_after = (deficit / refill_rate).ceil().max(1.0) as u64;
        RateLimitInfo {
            allowed: false,
            limit: capacity as usize,
            remaining: 0,
            retry_after_secs: retry_after,
        }
    };

    let serialized = serde_json::to_string(&state).unwrap_or_default();
    cache.set(&key, &serialized, ttl_secs).await;

    info
}

/// Rocket doesn't give us a monotonic "now" cheaply comparable across
/// process restarts, so the bucket clock is wall-clock epoch millis.
fn now_epoch_millis() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64
}
