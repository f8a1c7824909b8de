//! Per-client request throttling for the planning endpoints.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;

const SWEEP_EVERY: Duration = Duration::from_secs(60);

/// Sliding-window limiter keyed by client address.
#[derive(Clone)]
pub struct RateLimiter {
    hits: Arc<DashMap<String, Vec<Instant>>>,
    last_sweep: Arc<Mutex<Instant>>,
    window: Duration,
    max_requests: u32,
    enabled: bool,
    trust_proxy: bool,
}

impl RateLimiter {
    pub fn new(max_requests_per_second: u32, enabled: bool, trust_proxy: bool) -> Self {
        Self {
            hits: Arc::new(DashMap::new()),
            last_sweep: Arc::new(Mutex::new(Instant::now())),
            window: Duration::from_secs(1),
            max_requests: max_requests_per_second.max(1),
            enabled,
            trust_proxy,
        }
    }

    pub fn disabled() -> Self {
        Self::new(1, false, false)
    }

    /// Record a request from `client` and report whether it is allowed.
    pub fn allow(&self, client: &str) -> bool {
        if !self.enabled {
            return true;
        }

        let now = Instant::now();
        if self.sweep_due(now) {
            let window = self.window;
            self.hits
                .retain(|_, stamps| stamps.iter().any(|t| now.duration_since(*t) < window));
        }

        let mut entry = self.hits.entry(client.to_string()).or_default();
        let stamps = entry.value_mut();
        stamps.retain(|t| now.duration_since(*t) < self.window);
        if stamps.len() >= self.max_requests as usize {
            return false;
        }
        stamps.push(now);
        true
    }

    fn sweep_due(&self, now: Instant) -> bool {
        let mut last = match self.last_sweep.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if now.duration_since(*last) >= SWEEP_EVERY {
            *last = now;
            true
        } else {
            false
        }
    }

    pub fn tracked_clients(&self) -> usize {
        self.hits.len()
    }

    fn client_key(&self, request: &Request) -> String {
        let forwarded = if self.trust_proxy {
            request
                .headers()
                .get("x-forwarded-for")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.split(',').next())
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        } else {
            None
        };

        forwarded
            .or_else(|| {
                request
                    .extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|info| info.0.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string())
    }
}

pub async fn throttle(State(limiter): State<RateLimiter>, request: Request, next: Next) -> Response {
    let client = limiter.client_key(&request);
    if limiter.allow(&client) {
        return next.run(request).await;
    }

    tracing::warn!(%client, "rate limit exceeded");
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(serde_json::json!({
            "success": false,
            "message": "Too many requests, slow down",
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_budget_within_window() {
        let limiter = RateLimiter::new(2, true, false);
        assert!(limiter.allow("10.0.0.1"));
        assert!(limiter.allow("10.0.0.1"));
        assert!(!limiter.allow("10.0.0.1"));
        assert!(limiter.allow("10.0.0.2"));
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn disabled_limiter_allows_everything() {
        let limiter = RateLimiter::disabled();
        for _ in 0..10 {
            assert!(limiter.allow("10.0.0.1"));
        }
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn forwarded_header_only_used_when_trusted() {
        let request = axum::http::Request::builder()
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(RateLimiter::new(2, true, true).client_key(&request), "203.0.113.9");
        assert_eq!(RateLimiter::new(2, true, false).client_key(&request), "unknown");
    }
}
