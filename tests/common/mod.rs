#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::sync::Notify;

use netscan_console::backend::{BackendReply, ScanBackend, TransportFailure};
use netscan_console::request::ScanRequest;

/// What the fake scanning service does with every request.
#[derive(Debug, Clone)]
pub enum Script {
    Reply(u16, String),
    Unreachable,
}

/// In-process scanning service: counts calls, records requests, and can be held open.
pub struct FakeBackend {
    script: Script,
    calls: AtomicUsize,
    seen: Mutex<Vec<ScanRequest>>,
    gate: Option<Arc<Notify>>,
}

impl FakeBackend {
    pub fn replying(status: u16, body: &str) -> Self {
        Self::new(Script::Reply(status, body.to_string()))
    }

    pub fn unreachable() -> Self {
        Self::new(Script::Unreachable)
    }

    fn new(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Hold every dispatch until the gate is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<ScanRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScanBackend for FakeBackend {
    async fn dispatch(&self, request: &ScanRequest) -> Result<BackendReply, TransportFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.script {
            Script::Reply(status, body) => Ok(BackendReply {
                status: *status,
                body: body.clone(),
            }),
            Script::Unreachable => Err(TransportFailure(anyhow!("connection refused"))),
        }
    }
}

/// Yield until the backend has seen `n` dispatches.
pub async fn wait_for_calls(backend: &FakeBackend, n: usize) {
    while backend.calls() < n {
        tokio::task::yield_now().await;
    }
}
