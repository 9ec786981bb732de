use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use foro_backend::{
    AppState,
    config::Config,
    counter::CounterIncrementer,
    database::CounterOperation,
    infrastructure::{CaptchaPolicy, TurnstileVerifier},
    rate_limit::{PolicyTable, RateLimiter},
    router::create_router,
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    // 设置数据库连接池
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'foro_backend';")
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    // 设置限流器，凭据缺失时使用进程内计数
    let rate_limiter = Arc::new(RateLimiter::from_config(&config, PolicyTable::default()));
    tracing::info!("Rate limiter mode: {}", rate_limiter.mode());

    // 定期清理过期的进程内窗口
    let purge_limiter = Arc::clone(&rate_limiter);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = purge_limiter.local_store().purge_expired();
            if purged > 0 {
                tracing::debug!("Purged {} expired rate limit windows", purged);
            }
        }
    });

    let captcha = TurnstileVerifier::new(
        config.turnstile_secret_key.clone(),
        config.turnstile_timeout(),
    )
    .expect("Failed to build Turnstile client");
    if !captcha.is_enabled() {
        tracing::warn!("TURNSTILE_SECRET_KEY not set, CAPTCHA checks will fail open");
    }

    // 设置应用状态
    let state = AppState {
        counters: CounterIncrementer::new(Arc::new(CounterOperation::new(Arc::new(pool)))),
        captcha: Arc::new(captcha),
        captcha_policy: CaptchaPolicy::FailOpen,
    };

    let router = create_router(state, rate_limiter);

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(CorsLayer::permissive())
    };

    // 启动服务器
    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
