use super::{Transport, TransportRequest, TransportResponse};
use crate::core::error::MaintenanceError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum Step {
    Reply(u16, String),
    Fail(String),
    Hang,
}

/// Scripted transport: answers each call with the next queued step, then
/// with the fallback once the queue is empty.
pub struct FakeTransport {
    script: Mutex<VecDeque<Step>>,
    fallback: Mutex<Step>,
    requests: Mutex<Vec<TransportRequest>>,
    calls: AtomicU32,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(Step::Fail("no scripted response".to_string())),
            requests: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
        })
    }

    pub fn reply(&self, status: u16, body: &str) {
        self.push(Step::Reply(status, body.to_string()));
    }

    pub fn fail(&self, reason: &str) {
        self.push(Step::Fail(reason.to_string()));
    }

    pub fn hang(&self) {
        self.push(Step::Hang);
    }

    pub fn set_fallback_reply(&self, status: u16, body: &str) {
        *self.fallback.lock().unwrap() = Step::Reply(status, body.to_string());
    }

    pub fn set_fallback_failure(&self, reason: &str) {
        *self.fallback.lock().unwrap() = Step::Fail(reason.to_string());
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn push(&self, step: Step) {
        self.script.lock().unwrap().push_back(step);
    }

    fn next_step(&self) -> Step {
        let queued = self.script.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| self.fallback.lock().unwrap().clone())
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(
        &self,
        request: &TransportRequest,
    ) -> Result<TransportResponse, MaintenanceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        match self.next_step() {
            Step::Reply(status, body) => Ok(TransportResponse { status, body }),
            Step::Fail(reason) => Err(MaintenanceError::Network(reason)),
            Step::Hang => std::future::pending().await,
        }
    }
}
