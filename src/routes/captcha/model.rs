use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CaptchaRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct CaptchaResponse {
    /// 服务不可用但按 fail-open 放行时为 true
    pub degraded: bool,
}
