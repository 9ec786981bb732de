use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::time::Instant;

use super::{RateLimitError, RoutePolicy};

/// 记录一次请求后窗口的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHit {
    pub count: u32,
    pub reset_at: DateTime<Utc>,
}

/// 限流计数的存储后端
///
/// 每次调用都会计数，包括最终被拒绝的请求。
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// 用于日志的后端名称
    fn name(&self) -> &'static str;

    async fn hit(&self, key: &str, policy: RoutePolicy) -> Result<WindowHit, RateLimitError>;
}

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    window_start: Instant,
    window: Duration,
}

/// 进程内固定窗口计数，仅对单实例有效，重启后清零
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, WindowEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 同步版本的 `hit`，同一个键的读改写在分片锁内完成
    pub fn record(&self, key: &str, policy: RoutePolicy) -> WindowHit {
        let now = Instant::now();
        let window = policy.window();

        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert(WindowEntry {
                count: 0,
                window_start: now,
                window,
            });

        if now.duration_since(entry.window_start) >= entry.window {
            entry.count = 0;
            entry.window_start = now;
            entry.window = window;
        }
        entry.count = entry.count.saturating_add(1);

        let left = entry
            .window
            .saturating_sub(now.duration_since(entry.window_start));
        let reset_at = Utc::now()
            + chrono::Duration::from_std(left).unwrap_or_else(|_| chrono::Duration::zero());

        WindowHit {
            count: entry.count,
            reset_at,
        }
    }

    /// 删除已过期的窗口，返回删除数量
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries
            .retain(|_, e| now.duration_since(e.window_start) < e.window);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl RateLimitStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn hit(&self, key: &str, policy: RoutePolicy) -> Result<WindowHit, RateLimitError> {
        Ok(self.record(key, policy))
    }
}
