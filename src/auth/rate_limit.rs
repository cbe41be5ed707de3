//! Rate limiting primitives for auth flows.

use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

#[derive(Clone, Copy, Debug)]
pub enum RateLimitAction {
    SendCode,
    VerifyCode,
}

impl RateLimitAction {
    fn as_str(self) -> &'static str {
        match self {
            Self::SendCode => "send-code",
            Self::VerifyCode => "verify-code",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited,
}

pub trait RateLimiter: Send + Sync {
    fn check_ip(&self, ip: Option<&str>, action: RateLimitAction) -> RateLimitDecision;
    fn check_email(&self, email: &str, action: RateLimitAction) -> RateLimitDecision;
}

/// Backs the relaxed process-wide configuration: rate limiting disabled.
#[derive(Clone, Debug)]
pub struct NoopRateLimiter;

impl RateLimiter for NoopRateLimiter {
    fn check_ip(&self, _ip: Option<&str>, _action: RateLimitAction) -> RateLimitDecision {
        RateLimitDecision::Allowed
    }

    fn check_email(&self, _email: &str, _action: RateLimitAction) -> RateLimitDecision {
        RateLimitDecision::Allowed
    }
}

#[derive(Debug)]
struct Bucket {
    window_start: Instant,
    count: u32,
}

/// In-memory fixed-window limiter keyed by action + caller identity.
///
/// Bucket state is process-shared; the per-request handler only carries the
/// enabled flag, otherwise a fresh instance per request would never
/// accumulate a window.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    window: Duration,
    max_requests: u32,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl FixedWindowLimiter {
    #[must_use]
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    fn check(&self, key: String) -> RateLimitDecision {
        let now = Instant::now();
        let Ok(mut buckets) = self.buckets.lock() else {
            // A poisoned lock means a panic elsewhere; fail closed.
            return RateLimitDecision::Limited;
        };
        buckets.retain(|_, bucket| now.duration_since(bucket.window_start) < self.window);

        let bucket = buckets.entry(key).or_insert(Bucket {
            window_start: now,
            count: 0,
        });
        if bucket.count >= self.max_requests {
            return RateLimitDecision::Limited;
        }
        bucket.count += 1;
        RateLimitDecision::Allowed
    }
}

impl RateLimiter for FixedWindowLimiter {
    fn check_ip(&self, ip: Option<&str>, action: RateLimitAction) -> RateLimitDecision {
        // Without a caller address there is nothing to bucket on.
        let Some(ip) = ip else {
            return RateLimitDecision::Allowed;
        };
        self.check(format!("ip:{}:{ip}", action.as_str()))
    }

    fn check_email(&self, email: &str, action: RateLimitAction) -> RateLimitDecision {
        self.check(format!("email:{}:{email}", action.as_str()))
    }
}
