use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::{
    AppState,
    middleware::{log_errors, rate_limit},
    rate_limit::RateLimiter,
    routes,
};

async fn health() -> &'static str {
    "ok"
}

// 计数相关的路由
pub fn counter_routes() -> Router<AppState> {
    Router::new()
        .route("/api/hilos/{id}/vista", post(routes::counter::register_thread_view))
        .route("/api/posts/{id}/voto", post(routes::counter::register_post_vote))
}

// 验证码相关的路由
pub fn captcha_routes() -> Router<AppState> {
    Router::new().route("/api/captcha/verificar", post(routes::captcha::verify_captcha))
}

// 创建主路由，所有请求先经过限流
pub fn create_router(state: AppState, limiter: Arc<RateLimiter>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(counter_routes())
        .merge(captcha_routes())
        .layer(axum::middleware::from_fn(log_errors))
        .layer(axum::middleware::from_fn_with_state(limiter, rate_limit))
        .with_state(state)
}
