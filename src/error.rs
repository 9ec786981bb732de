use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::middleware::apply_rate_limit_headers;
use crate::rate_limit::RateLimitDecision;
use crate::utils::{error_codes, error_to_api_response};

#[derive(Debug)]
pub enum AppError {
    RateLimited(RateLimitDecision),
    CaptchaRejected,
    Validation(String),
    InternalServerError,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, msg) = match &self {
            AppError::RateLimited(decision) => (
                StatusCode::TOO_MANY_REQUESTS,
                error_codes::RATE_LIMIT,
                format!(
                    "Demasiadas solicitudes, reintenta en {} segundos",
                    decision.retry_after_secs()
                ),
            ),
            AppError::CaptchaRejected => (
                StatusCode::FORBIDDEN,
                error_codes::CAPTCHA_FAILED,
                "Verificación CAPTCHA fallida".to_string(),
            ),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                error_codes::VALIDATION_ERROR,
                msg.clone(),
            ),
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
                "Error interno del servidor".to_string(),
            ),
        };

        let mut response = (status, error_to_api_response::<()>(code, msg)).into_response();

        if let AppError::RateLimited(decision) = &self {
            apply_rate_limit_headers(response.headers_mut(), decision);
            if let Ok(value) = HeaderValue::from_str(&decision.retry_after_secs().to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}
