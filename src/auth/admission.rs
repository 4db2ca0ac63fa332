use async_trait::async_trait;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

use crate::auth::middleware::Identity;
use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Tokens charged per admitted mutation.
pub const WRITE_COST: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    Allow,
    RateLimited { remaining: u32, reset_in_secs: u64 },
    Blocked,
}

/// Decides whether a mutating request from `external_id` may proceed.
#[async_trait]
pub trait AdmissionOracle: Send + Sync {
    async fn decide(&self, external_id: &str, requested: u32) -> anyhow::Result<AdmissionDecision>;
}

/// Consults the oracle before a mutation. Oracle errors and timeouts deny.
pub async fn admit(
    oracle: &dyn AdmissionOracle,
    identity: &Identity,
    requested: u32,
    timeout: Duration,
) -> AppResult<()> {
    let external_id = identity
        .external_id
        .as_deref()
        .ok_or(AppError::Unauthenticated)?;

    let decision = match tokio::time::timeout(timeout, oracle.decide(external_id, requested)).await {
        Ok(Ok(decision)) => decision,
        Ok(Err(e)) => {
            tracing::error!(error = %e, external_id = %external_id, "Admission oracle failed");
            return Err(AppError::RequestBlocked);
        }
        Err(_) => {
            tracing::error!(external_id = %external_id, "Admission oracle timed out");
            return Err(AppError::RequestBlocked);
        }
    };

    match decision {
        AdmissionDecision::Allow => Ok(()),
        AdmissionDecision::RateLimited {
            remaining,
            reset_in_secs,
        } => {
            tracing::warn!(
                code = "RATE_LIMIT_EXCEEDED",
                external_id = %external_id,
                remaining = remaining,
                reset_in_secs = reset_in_secs,
                "Rate limit exceeded"
            );
            Err(AppError::RateLimited {
                remaining,
                reset_in_secs,
            })
        }
        AdmissionDecision::Blocked => {
            tracing::warn!(external_id = %external_id, "Request blocked");
            Err(AppError::RequestBlocked)
        }
    }
}

/// In-memory token bucket per identity (for single-instance deployments),
/// with a static block list.
#[derive(Clone)]
pub struct TokenBucketOracle {
    buckets: Arc<Mutex<HashMap<String, Bucket>>>,
    blocked: Arc<HashSet<String>>,
    capacity: u32,
    refill: u32,
    interval: Duration,
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucketOracle {
    pub fn new(capacity: u32, refill: u32, interval: Duration, blocked: Vec<String>) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            blocked: Arc::new(blocked.into_iter().collect()),
            capacity,
            refill,
            interval,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.rate_limit_capacity,
            config.rate_limit_refill,
            Duration::from_secs(config.rate_limit_interval_secs),
            config.blocked_identities.clone(),
        )
    }

    async fn take_at(&self, key: &str, requested: u32, now: Instant) -> AdmissionDecision {
        if self.blocked.contains(key) {
            return AdmissionDecision::Blocked;
        }

        let mut buckets = self.buckets.lock().await;
        let capacity = self.capacity as f64;
        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            tokens: capacity,
            last_refill: now,
        });

        let interval = self.interval.as_secs_f64();
        let refill = self.refill as f64;
        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        if interval > 0.0 {
            bucket.tokens = (bucket.tokens + elapsed * refill / interval).min(capacity);
        }
        bucket.last_refill = now;

        let requested = requested as f64;
        if bucket.tokens >= requested {
            bucket.tokens -= requested;
            return AdmissionDecision::Allow;
        }

        let missing = requested - bucket.tokens;
        let reset_in_secs = if refill > 0.0 {
            (missing * interval / refill).ceil() as u64
        } else {
            self.interval.as_secs()
        };

        AdmissionDecision::RateLimited {
            remaining: bucket.tokens.floor() as u32,
            reset_in_secs,
        }
    }

    /// Drop buckets that have been idle long enough to be full again.
    pub async fn cleanup(&self) {
        let mut buckets = self.buckets.lock().await;
        let now = Instant::now();
        let idle = self.interval * 2;
        buckets.retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) < idle);
    }
}

#[async_trait]
impl AdmissionOracle for TokenBucketOracle {
    async fn decide(&self, external_id: &str, requested: u32) -> anyhow::Result<AdmissionDecision> {
        Ok(self.take_at(external_id, requested, Instant::now()).await)
    }
}
