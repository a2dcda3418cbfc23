use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::backend::{BackendReply, ScanBackend, TransportFailure};
use crate::error::{ScanError, BACKEND_FALLBACK};
use crate::request::{build_request, ScanRequest};
use crate::types::ResultModel;
use crate::validate::validate_target;

/// Lifecycle of the single scan the controller tracks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScanOutcome {
    #[default]
    Idle,
    InFlight,
    Succeeded(Arc<ResultModel>),
    Failed(String),
}

impl ScanOutcome {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, ScanOutcome::InFlight)
    }

    pub fn result(&self) -> Option<&ResultModel> {
        match self {
            ScanOutcome::Succeeded(model) => Some(model),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ScanOutcome::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn state_name(&self) -> &'static str {
        match self {
            ScanOutcome::Idle => "idle",
            ScanOutcome::InFlight => "in_flight",
            ScanOutcome::Succeeded(_) => "succeeded",
            ScanOutcome::Failed(_) => "failed",
        }
    }
}

/// Single-flight scan orchestrator.
///
/// At most one request is outstanding; a second `request_scan` while one is in flight is
/// refused with [`ScanError::Busy`] and sends nothing. The last outcome stays visible until
/// the next accepted request replaces it.
pub struct ScanController<B> {
    backend: B,
    outcome: Mutex<ScanOutcome>,
}

impl<B: ScanBackend> ScanController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            outcome: Mutex::new(ScanOutcome::Idle),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Snapshot of the current outcome.
    pub fn outcome(&self) -> ScanOutcome {
        self.cell().clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.cell().is_in_flight()
    }

    /// Validate, build and dispatch one scan, then wait for it to settle.
    ///
    /// `Err` means the request was refused before anything was sent and the previous
    /// outcome is untouched. Backend and transport failures are not errors here: they
    /// settle the scan as [`ScanOutcome::Failed`], which is returned.
    pub async fn request_scan(&self, target: &str, label: &str) -> Result<ScanOutcome, ScanError> {
        let request = self.accept(target, label)?;
        Ok(self.settle(request).await)
    }

    /// Accept a scan now and run it on a background task.
    pub fn spawn_scan(
        self: &Arc<Self>,
        target: &str,
        label: &str,
    ) -> Result<JoinHandle<ScanOutcome>, ScanError>
    where
        B: 'static,
    {
        let request = self.accept(target, label)?;
        let this = Arc::clone(self);
        Ok(tokio::spawn(async move { this.settle(request).await }))
    }

    fn accept(&self, target: &str, label: &str) -> Result<ScanRequest, ScanError> {
        let mut cell = self.cell();
        if cell.is_in_flight() {
            tracing::info!(host = target, "scan refused: another scan is in flight");
            return Err(ScanError::Busy);
        }
        if !validate_target(target) {
            tracing::info!(host = target, "scan refused: invalid target");
            return Err(ScanError::InvalidTarget);
        }
        let request = build_request(target, label)?;
        *cell = ScanOutcome::InFlight;
        tracing::info!(host = target, scan_type = %request.scan_type, "scan accepted");
        Ok(request)
    }

    async fn settle(&self, request: ScanRequest) -> ScanOutcome {
        let mut guard = InFlightGuard {
            cell: &self.outcome,
            armed: true,
        };

        let outcome = match self.backend.dispatch(&request).await {
            Ok(reply) => match classify_reply(&reply) {
                Ok(model) => {
                    tracing::info!(host = %request.target, hosts = model.hosts.len(), "scan succeeded");
                    ScanOutcome::Succeeded(Arc::new(model))
                }
                Err(err) => {
                    tracing::warn!(host = %request.target, status = reply.status, error = %err, "scan failed");
                    ScanOutcome::Failed(err.to_string())
                }
            },
            Err(TransportFailure(cause)) => {
                tracing::warn!(host = %request.target, error = %format!("{cause:#}"), "scan service unreachable");
                ScanOutcome::Failed(ScanError::Transport.to_string())
            }
        };

        guard.armed = false;
        *self.cell() = outcome.clone();
        outcome
    }

    fn cell(&self) -> MutexGuard<'_, ScanOutcome> {
        self.outcome.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Settles the cell as a transport failure if the dispatch future is dropped or panics,
/// so the controller never stays in flight.
struct InFlightGuard<'a> {
    cell: &'a Mutex<ScanOutcome>,
    armed: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut cell = self.cell.lock().unwrap_or_else(PoisonError::into_inner);
            *cell = ScanOutcome::Failed(ScanError::Transport.to_string());
        }
    }
}

/// Turn a raw backend reply into a model or a failure.
///
/// 2xx bodies that do not parse are [`ScanError::Malformed`].
/// Non-2xx replies use the body's `error` string, or a fixed fallback.
pub fn classify_reply(reply: &BackendReply) -> Result<ResultModel, ScanError> {
    if reply.is_success() {
        return ResultModel::from_json(&reply.body).map_err(|e| {
            tracing::warn!(error = %e, "unparseable scan response");
            ScanError::Malformed
        });
    }
    let message = backend_error_message(&reply.body).unwrap_or_else(|| BACKEND_FALLBACK.to_string());
    Err(ScanError::Backend(message))
}

fn backend_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
