//! 请求级限流
//!
//! 配置了 Redis 凭据时由 Redis 计数，多实例共享窗口；否则退化为进程内计数。
//! Redis 出错时本次请求改由进程内计数决定，调用方永远拿到一个决定而不是错误。
//! 两种后端的窗口互相独立，切换时不做合并。

pub mod policy;
pub mod redis_store;
pub mod store;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::cache::keys::rate_limit_key;
use crate::config::Config;

pub use policy::{DEFAULT_ROUTE, PolicyTable, ResolvedPolicy, RoutePolicy};
pub use redis_store::RedisStore;
pub use store::{MemoryStore, RateLimitStore, WindowHit};

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("invalid rate limit store response: {0}")]
    InvalidResponse(String),
}

/// 一次准入判断的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    /// 本次请求之后窗口内剩余次数
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitDecision {
    fn from_hit(hit: WindowHit, policy: RoutePolicy) -> Self {
        Self {
            allowed: hit.count <= policy.max_requests,
            limit: policy.max_requests,
            remaining: policy.max_requests.saturating_sub(hit.count),
            reset_at: hit.reset_at,
        }
    }

    /// 距窗口重置的秒数，至少为 1
    pub fn retry_after_secs(&self) -> u64 {
        let secs = (self.reset_at - Utc::now()).num_seconds();
        u64::try_from(secs).unwrap_or(0).max(1)
    }
}

pub struct RateLimiter {
    distributed: Option<Arc<dyn RateLimitStore>>,
    local: MemoryStore,
    policies: PolicyTable,
}

impl RateLimiter {
    /// 仅使用进程内计数
    pub fn local(policies: PolicyTable) -> Self {
        Self {
            distributed: None,
            local: MemoryStore::new(),
            policies,
        }
    }

    /// 使用给定的共享后端，出错时回退到进程内计数
    pub fn with_store(store: Arc<dyn RateLimitStore>, policies: PolicyTable) -> Self {
        Self {
            distributed: Some(store),
            local: MemoryStore::new(),
            policies,
        }
    }

    /// 根据启动时是否存在 Redis 凭据选择后端，缺少凭据不算错误
    pub fn from_config(config: &Config, policies: PolicyTable) -> Self {
        let Some(credentials) = &config.rate_limit_redis else {
            tracing::info!("Rate limiter using in-memory store (no Redis credentials)");
            return Self::local(policies);
        };

        match RedisStore::connect(credentials) {
            Ok(store) => {
                tracing::info!("Rate limiter using Redis store");
                Self::with_store(Arc::new(store), policies)
            }
            Err(e) => {
                tracing::warn!("Invalid Redis credentials, using in-memory store: {}", e);
                Self::local(policies)
            }
        }
    }

    pub fn mode(&self) -> &'static str {
        self.distributed
            .as_ref()
            .map(|s| s.name())
            .unwrap_or_else(|| self.local.name())
    }

    pub fn local_store(&self) -> &MemoryStore {
        &self.local
    }

    pub async fn check(&self, pathname: &str, identifier: &str) -> RateLimitDecision {
        let ResolvedPolicy { route, policy } = self.policies.resolve(pathname);
        let key = rate_limit_key(route, identifier);

        let hit = match &self.distributed {
            Some(store) => match store.hit(&key, policy).await {
                Ok(hit) => hit,
                Err(e) => {
                    tracing::warn!(
                        "Rate limit store {} failed, falling back to memory: {}",
                        store.name(),
                        e
                    );
                    self.local.record(&key, policy)
                }
            },
            None => self.local.record(&key, policy),
        };

        let decision = RateLimitDecision::from_hit(hit, policy);
        tracing::debug!(
            key = %key,
            allowed = decision.allowed,
            remaining = decision.remaining,
            "rate limit decision"
        );
        decision
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;

    struct UnreachableStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RateLimitStore for UnreachableStore {
        fn name(&self) -> &'static str {
            "unreachable"
        }

        async fn hit(&self, _key: &str, _policy: RoutePolicy) -> Result<WindowHit, RateLimitError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(RateLimitError::InvalidResponse("connection refused".into()))
        }
    }

    /// 预置计数的共享存储
    struct SharedStore {
        count: AtomicUsize,
        reset_at: DateTime<Utc>,
    }

    #[async_trait]
    impl RateLimitStore for SharedStore {
        fn name(&self) -> &'static str {
            "shared"
        }

        async fn hit(&self, _key: &str, _policy: RoutePolicy) -> Result<WindowHit, RateLimitError> {
            let count = self.count.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(WindowHit {
                count: count as u32,
                reset_at: self.reset_at,
            })
        }
    }

    #[tokio::test]
    async fn shared_store_drives_decision_without_local_counting() {
        let reset_at = Utc::now() + chrono::Duration::seconds(42);
        let store = Arc::new(SharedStore {
            count: AtomicUsize::new(4),
            reset_at,
        });
        let limiter = RateLimiter::with_store(store, PolicyTable::default());

        let decision = limiter.check("/login", "k").await;
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 0);
        assert_eq!(decision.reset_at, reset_at);

        let decision = limiter.check("/login", "k").await;
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
        assert_eq!(decision.limit, 5);

        assert!(limiter.local_store().is_empty());
    }

    #[tokio::test]
    async fn login_allows_five_then_rejects() {
        let limiter = RateLimiter::local(PolicyTable::default());

        for expected in [4, 3, 2, 1, 0] {
            let decision = limiter.check("/login", "198.51.100.1").await;
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected);
            assert_eq!(decision.limit, 5);
        }

        let decision = limiter.check("/login", "198.51.100.1").await;
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_key_is_admitted_after_reset() {
        let limiter = RateLimiter::local(PolicyTable::default());
        for _ in 0..6 {
            limiter.check("/login", "k").await;
        }
        assert!(!limiter.check("/login", "k").await.allowed);

        tokio::time::advance(Duration::from_secs(61)).await;

        let decision = limiter.check("/login", "k").await;
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 4);
    }

    #[tokio::test]
    async fn unmatched_route_uses_default_policy() {
        let limiter = RateLimiter::local(PolicyTable::default());

        let decision = limiter.check("/foro/general/hilo-42", "k").await;
        assert!(decision.allowed);
        assert_eq!(decision.limit, 100);
        assert_eq!(decision.remaining, 99);
    }

    #[tokio::test]
    async fn routes_and_callers_are_counted_separately() {
        let limiter = RateLimiter::local(PolicyTable::default());
        for _ in 0..5 {
            limiter.check("/login", "a").await;
        }

        assert!(!limiter.check("/login", "a").await.allowed);
        assert!(limiter.check("/login", "b").await.allowed);
        assert!(limiter.check("/nuevo-hilo", "a").await.allowed);
    }

    #[tokio::test]
    async fn store_failure_falls_back_to_memory() {
        let store = Arc::new(UnreachableStore {
            calls: AtomicUsize::new(0),
        });
        let limiter = RateLimiter::with_store(store.clone(), PolicyTable::default());
        assert_eq!(limiter.mode(), "unreachable");

        for _ in 0..5 {
            assert!(limiter.check("/login", "k").await.allowed);
        }
        assert!(!limiter.check("/login", "k").await.allowed);
        assert_eq!(store.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn concurrent_callers_never_exceed_max() {
        let limiter = Arc::new(RateLimiter::local(PolicyTable::default()));

        let handles = (0..20).map(|_| {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move { limiter.check("/registro", "k").await })
        });
        let results = futures_util::future::join_all(handles).await;

        let admitted = results
            .into_iter()
            .filter(|r| matches!(r, Ok(d) if d.allowed))
            .count();
        assert_eq!(admitted, 3);
    }

    #[test]
    fn retry_after_is_at_least_one_second() {
        let decision = RateLimitDecision {
            allowed: false,
            limit: 5,
            remaining: 0,
            reset_at: Utc::now(),
        };
        assert_eq!(decision.retry_after_secs(), 1);
    }
}
