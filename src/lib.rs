use std::sync::Arc;

use counter::CounterIncrementer;
use infrastructure::{CaptchaPolicy, CaptchaVerifier};

pub mod cache;
pub mod config;
pub mod counter;
pub mod database;
pub mod error;
pub mod infrastructure;
pub mod middleware;
pub mod rate_limit;
pub mod router;
pub mod routes;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub counters: CounterIncrementer,
    pub captcha: Arc<dyn CaptchaVerifier>,
    pub captcha_policy: CaptchaPolicy,
}
