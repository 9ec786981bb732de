use axum::{Json, extract::State, http::HeaderMap};

use super::model::{CaptchaRequest, CaptchaResponse};
use crate::{
    AppState,
    error::AppError,
    infrastructure::VerifyOutcome,
    utils::{ApiResponse, header_ip, success_to_api_response},
};

pub async fn verify_captcha(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CaptchaRequest>,
) -> Result<Json<ApiResponse<CaptchaResponse>>, AppError> {
    let ip = header_ip(&headers);
    let outcome = state.captcha.verify(&req.token, ip.as_deref()).await;

    if !state.captcha_policy.admits(outcome) {
        return Err(AppError::CaptchaRejected);
    }
    if outcome == VerifyOutcome::Unavailable {
        tracing::warn!("CAPTCHA service unavailable, admitting request");
    }

    Ok(success_to_api_response(CaptchaResponse {
        degraded: outcome == VerifyOutcome::Unavailable,
    }))
}
