// 缓存模块
// 包含 Redis 中的限流数据结构和操作

pub mod keys;
pub mod models;
pub mod operations;

pub use models::rate_limit::CachedRateLimit;
pub use operations::rate_limit::RateLimitCacheOperations;
