//! Recording transport for unit tests

use super::{Response, Transport};
use crate::error::Result;
use crate::operation::Request;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays queued responses and records every request it is handed
#[derive(Default)]
pub(crate) struct RecordingTransport {
    responses: Mutex<VecDeque<Result<Response>>>,
    sent: Mutex<Vec<Request>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, status: u16, body: Value) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(Response::json(status, body)));
        self
    }

    pub fn respond_empty(&self, status: u16) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(Response::empty(status)));
        self
    }

    pub fn fail(&self, error: crate::error::Error) -> &Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn sent(&self) -> Vec<Request> {
        self.sent.lock().unwrap().clone()
    }

    /// Operation names in the order they were sent
    pub fn operations(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.operation.clone())
            .collect()
    }
}

impl Transport for RecordingTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        self.sent.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Response::empty(204)))
    }
}
