mod handler;
mod model;

pub use handler::{register_post_vote, register_thread_view};
pub use model::{CounterResponse, VoteRequest};
