use std::time::Duration;

/// 未命中任何前缀时使用的路由分类
pub const DEFAULT_ROUTE: &str = "default";

/// 单条路由的限流配额
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePolicy {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl RoutePolicy {
    pub const fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// 按声明顺序匹配的路由前缀表，进程启动后不可修改
#[derive(Debug, Clone)]
pub struct PolicyTable {
    routes: Vec<(String, RoutePolicy)>,
    fallback: RoutePolicy,
}

/// 一次匹配的结果：路由分类 + 配额
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPolicy<'a> {
    pub route: &'a str,
    pub policy: RoutePolicy,
}

impl PolicyTable {
    pub fn new<I, S>(routes: I, fallback: RoutePolicy) -> Self
    where
        I: IntoIterator<Item = (S, RoutePolicy)>,
        S: Into<String>,
    {
        Self {
            routes: routes.into_iter().map(|(p, r)| (p.into(), r)).collect(),
            fallback,
        }
    }

    /// 第一个作为 `pathname` 前缀的条目生效
    pub fn resolve(&self, pathname: &str) -> ResolvedPolicy<'_> {
        self.routes
            .iter()
            .find(|(prefix, _)| pathname.starts_with(prefix.as_str()))
            .map(|(prefix, policy)| ResolvedPolicy {
                route: prefix.as_str(),
                policy: *policy,
            })
            .unwrap_or(ResolvedPolicy {
                route: DEFAULT_ROUTE,
                policy: self.fallback,
            })
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::new(
            [
                ("/login", RoutePolicy::new(5, 60)),
                ("/registro", RoutePolicy::new(3, 300)),
                ("/nuevo-hilo", RoutePolicy::new(10, 60)),
                ("/api/", RoutePolicy::new(60, 60)),
            ],
            RoutePolicy::new(100, 60),
        )
    }
}
