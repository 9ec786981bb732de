use std::sync::LazyLock;

use redis::{Script, aio::ConnectionManager};

use crate::cache::models::rate_limit::CachedRateLimit;

// INCR 与 EXPIRE 在同一脚本内执行，键始终带过期时间
static HIT_SCRIPT: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r#"
        local count = redis.call('INCR', KEYS[1])
        if count == 1 then
            redis.call('EXPIRE', KEYS[1], ARGV[1])
        end
        local ttl = redis.call('TTL', KEYS[1])
        if ttl < 0 then
            redis.call('EXPIRE', KEYS[1], ARGV[1])
            ttl = tonumber(ARGV[1])
        end
        return {count, ttl}
        "#,
    )
});

/// 速率限制缓存操作
pub struct RateLimitCacheOperations;

impl RateLimitCacheOperations {
    /// 原子地记录一次请求，返回当前窗口计数与重置时间
    pub async fn hit(
        conn: &mut ConnectionManager,
        key: &str,
        window_secs: u64,
    ) -> Result<CachedRateLimit, redis::RedisError> {
        let (count, ttl): (i64, i64) = HIT_SCRIPT
            .key(key)
            .arg(window_secs)
            .invoke_async(conn)
            .await?;

        Ok(CachedRateLimit {
            count: u32::try_from(count).unwrap_or(u32::MAX),
            reset_at: chrono::Utc::now().timestamp() + ttl.max(0),
        })
    }
}
