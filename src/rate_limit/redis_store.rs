use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{Client as RedisClient, IntoConnectionInfo};
use tokio::sync::OnceCell;

use super::store::{RateLimitStore, WindowHit};
use super::{RateLimitError, RoutePolicy};
use crate::cache::{CachedRateLimit, RateLimitCacheOperations};
use crate::config::RedisCredentials;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const CONNECT_RETRIES: usize = 1;

/// Redis 固定窗口计数，多实例共享
///
/// 连接在首次使用时建立并复用；建立失败时下次调用重试。
pub struct RedisStore {
    client: RedisClient,
    conn: OnceCell<ConnectionManager>,
}

impl RedisStore {
    pub fn new(client: RedisClient) -> Self {
        Self {
            client,
            conn: OnceCell::new(),
        }
    }

    /// token 作为连接密码使用
    pub fn connect(credentials: &RedisCredentials) -> Result<Self, RateLimitError> {
        let mut info = credentials.url.as_str().into_connection_info()?;
        info.redis.password = Some(credentials.token.clone());
        Ok(Self::new(RedisClient::open(info)?))
    }

    async fn connection(&self) -> Result<ConnectionManager, RateLimitError> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let config = ConnectionManagerConfig::new()
                    .set_connection_timeout(CONNECT_TIMEOUT)
                    .set_number_of_retries(CONNECT_RETRIES);
                let conn = ConnectionManager::new_with_config(self.client.clone(), config).await?;
                tracing::info!("Connected to Redis rate limit store");
                Ok::<_, RateLimitError>(conn)
            })
            .await?;

        Ok(conn.clone())
    }
}

fn window_hit(cached: CachedRateLimit) -> Result<WindowHit, RateLimitError> {
    let reset_at = DateTime::from_timestamp(cached.reset_at, 0).ok_or_else(|| {
        RateLimitError::InvalidResponse(format!("reset_at out of range: {}", cached.reset_at))
    })?;

    Ok(WindowHit {
        count: cached.count,
        reset_at,
    })
}

#[async_trait]
impl RateLimitStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn hit(&self, key: &str, policy: RoutePolicy) -> Result<WindowHit, RateLimitError> {
        let mut conn = self.connection().await?;
        let cached = RateLimitCacheOperations::hit(&mut conn, key, policy.window_secs).await?;
        window_hit(cached)
    }
}
