/// 缓存键模块
/// 提供各种缓存键生成函数
pub mod rate_limit_keys;

pub use rate_limit_keys::rate_limit_key;
