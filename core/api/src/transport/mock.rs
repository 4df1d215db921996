//! In-memory transport for testing.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use vimeo_common::Result;

use super::{ApiResponse, Transport};
use crate::request::PreparedRequest;

#[derive(Default)]
struct State {
    requests: Vec<PreparedRequest>,
    responses: VecDeque<Result<ApiResponse>>,
}

/// Transport that records every request and replays queued responses.
///
/// Once the queue runs dry every request gets `200 {}`. Clones share
/// the same recording, so a test can keep a handle after giving one to
/// the client.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    /// Create a transport with an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue an outcome for the next unanswered request.
    pub fn push(&self, outcome: Result<ApiResponse>) -> &Self {
        self.state().responses.push_back(outcome);
        self
    }

    /// Queue a successful JSON response.
    pub fn push_json(&self, status: StatusCode, body: serde_json::Value) -> &Self {
        self.push(Ok(ApiResponse::new(status, body)))
    }

    /// All requests seen so far, in order.
    pub fn requests(&self) -> Vec<PreparedRequest> {
        self.state().requests.clone()
    }

    /// Number of requests seen so far.
    pub fn request_count(&self) -> usize {
        self.state().requests.len()
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("MockTransport")
            .field("requests", &state.requests.len())
            .field("queued", &state.responses.len())
            .finish()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: PreparedRequest) -> Result<ApiResponse> {
        let mut state = self.state();
        state.requests.push(request);
        state
            .responses
            .pop_front()
            .unwrap_or_else(|| Ok(ApiResponse::new(StatusCode::OK, json!({}))))
    }
}
