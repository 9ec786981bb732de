use std::env;
use std::time::Duration;

/// 分布式限流存储的连接凭据
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RedisCredentials {
    pub url: String,
    pub token: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// URL 与 token 同时存在时才启用 Redis 限流
    pub rate_limit_redis: Option<RedisCredentials>,
    pub turnstile_secret_key: Option<String>,
    pub turnstile_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        let rate_limit_redis = match (
            optional_var("RATE_LIMIT_REDIS_URL"),
            optional_var("RATE_LIMIT_REDIS_TOKEN"),
        ) {
            (Some(url), Some(token)) => Some(RedisCredentials { url, token }),
            _ => None,
        };

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            rate_limit_redis,
            turnstile_secret_key: optional_var("TURNSTILE_SECRET_KEY"),
            turnstile_timeout_secs: env::var("TURNSTILE_TIMEOUT_SECS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(5),
        })
    }

    pub fn turnstile_timeout(&self) -> Duration {
        Duration::from_secs(self.turnstile_timeout_secs)
    }
}

// 空字符串视为未配置
fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turnstile_timeout_is_seconds() {
        let config = Config {
            database_url: "postgres://localhost/foro".into(),
            server_host: "127.0.0.1".into(),
            server_port: 3000,
            rate_limit_redis: None,
            turnstile_secret_key: None,
            turnstile_timeout_secs: 7,
        };
        assert_eq!(config.turnstile_timeout(), Duration::from_secs(7));
    }
}
