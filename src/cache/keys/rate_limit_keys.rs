/// 限流计数键前缀
const RATE_LIMIT_PREFIX: &str = "rate_limit:";

/// 生成限流计数键：路由分类 + 调用方标识
pub fn rate_limit_key(route: &str, identifier: &str) -> String {
    format!("{}{}:{}", RATE_LIMIT_PREFIX, route, identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_combines_route_and_identifier() {
        assert_eq!(
            rate_limit_key("/login", "203.0.113.7"),
            "rate_limit:/login:203.0.113.7"
        );
    }
}
