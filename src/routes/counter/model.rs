use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub delta: i64,
}

#[derive(Debug, Serialize)]
pub struct CounterResponse {
    pub id: Uuid,
    pub counter: &'static str,
}
