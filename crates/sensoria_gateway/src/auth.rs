//! API-key authentication and the per-key token bucket.
//!
//! Keys come from configuration (`SENSORIA_API_KEYS`). An empty key set
//! disables auth for local development. The authenticated subject (the key
//! itself) is stashed in request extensions for quota accounting.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use sensoria_core::Error;
use std::collections::HashSet;
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::error::ApiError;
use crate::state::AppState;

const API_KEY_HEADER: &str = "x-api-key";

/// The accepted key set.
#[derive(Debug, Default)]
pub struct AuthKeys {
    keys: HashSet<String>,
}

impl AuthKeys {
    pub fn new(keys: &[String]) -> Self {
        Self {
            keys: keys.iter().cloned().collect(),
        }
    }

    pub fn enabled(&self) -> bool {
        !self.keys.is_empty()
    }

    pub fn accepts(&self, key: &str) -> bool {
        self.keys.contains(key)
    }
}

/// The authenticated caller, one per request.
#[derive(Debug, Clone)]
pub struct Subject(pub String);

fn extract_key(request: &Request) -> Option<String> {
    if let Some(key) = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        return Some(key.to_string());
    }
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Middleware on every protected route: authenticate, then rate-limit.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let subject = if state.auth.enabled() {
        let key = extract_key(&request)
            .ok_or_else(|| Error::unauthorized("missing API key or bearer token"))?;
        if !state.auth.accepts(&key) {
            return Err(Error::unauthorized("unknown API key").into());
        }
        key
    } else {
        "anonymous".to_string()
    };

    if !state.limiter.check(&subject).await {
        return Err(Error::quota_exceeded("rate limit exceeded")
            .with_hint("slow down; the per-key bucket refills continuously")
            .into());
    }

    request.extensions_mut().insert(Subject(subject));
    Ok(next.run(request).await)
}

/// Token bucket per source key.
pub struct RateLimiter {
    rate_per_sec: f64,
    burst: f64,
    buckets: Mutex<HashMap<String, Bucket>>,
}

struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

impl RateLimiter {
    pub fn new(rate_per_sec: u32, burst: u32) -> Self {
        Self {
            rate_per_sec: rate_per_sec.max(1) as f64,
            burst: burst.max(1) as f64,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Take one token; false means the caller is over its burst budget.
    pub async fn check(&self, key: &str) -> bool {
        let mut buckets = self.buckets.lock().await;
        let now = Instant::now();
        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            tokens: self.burst,
            refilled_at: now,
        });
        let elapsed = now.duration_since(bucket.refilled_at).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.rate_per_sec).min(self.burst);
        bucket.refilled_at = now;
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}
