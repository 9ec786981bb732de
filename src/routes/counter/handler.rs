use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use super::model::{CounterResponse, VoteRequest};
use crate::{
    AppState,
    database::CounterTarget,
    error::AppError,
    utils::{ApiResponse, success_to_api_response},
};

// 浏览计数失败不影响页面本身
pub async fn register_thread_view(
    State(state): State<AppState>,
    Path(thread_id): Path<Uuid>,
) -> Json<ApiResponse<CounterResponse>> {
    state
        .counters
        .increment_by_one(&CounterTarget::thread_views(thread_id))
        .await;

    success_to_api_response(CounterResponse {
        id: thread_id,
        counter: "view_count",
    })
}

pub async fn register_post_vote(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<ApiResponse<CounterResponse>>, AppError> {
    if req.delta != 1 && req.delta != -1 {
        return Err(AppError::Validation("delta debe ser 1 o -1".into()));
    }

    state
        .counters
        .increment(&CounterTarget::post_votes(post_id), req.delta)
        .await;

    Ok(success_to_api_response(CounterResponse {
        id: post_id,
        counter: "vote_count",
    }))
}
