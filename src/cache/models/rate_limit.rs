use serde::{Deserialize, Serialize};

/// Redis 中一个限流窗口的快照
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CachedRateLimit {
    pub count: u32,
    pub reset_at: i64, // Unix timestamp
}
