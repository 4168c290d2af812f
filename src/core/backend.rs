//! Response backends and the execution contract around them.
//!
//! The engine never talks to a backend directly: every call goes through
//! [`execute_with_contract`], which bounds it with a timeout and turns any
//! failure into a classified [`ExecutionError`].

use async_trait::async_trait;
use futures::FutureExt;
use rand::Rng;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::routing::{ClassificationResult, Classifier};

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend not available: {0}")]
    NotAvailable(String),

    #[error("Classification failed: {0}")]
    Classification(String),

    #[error("Timeout")]
    Timeout,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, BackendError>;

/// Something that produces an agent reply for an utterance.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Produce a reply. `target` is the raw explicit target, if any.
    async fn respond(&self, utterance: &str, target: Option<&str>) -> Result<ClassificationResult>;
}

/// Stand-in for a real inference service: waits a random latency, then
/// answers with the local classifier.
pub struct SimulatedBackend {
    classifier: Classifier,
    min_latency: Duration,
    max_latency: Duration,
}

impl SimulatedBackend {
    pub fn new(classifier: Classifier, min_latency: Duration, max_latency: Duration) -> Self {
        let (min_latency, max_latency) = if min_latency <= max_latency {
            (min_latency, max_latency)
        } else {
            (max_latency, min_latency)
        };
        Self {
            classifier,
            min_latency,
            max_latency,
        }
    }

    fn pick_latency(&self) -> Duration {
        if self.min_latency == self.max_latency {
            return self.min_latency;
        }
        let ms = rand::thread_rng()
            .gen_range(self.min_latency.as_millis() as u64..=self.max_latency.as_millis() as u64);
        Duration::from_millis(ms)
    }
}

#[async_trait]
impl Backend for SimulatedBackend {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn respond(&self, utterance: &str, target: Option<&str>) -> Result<ClassificationResult> {
        let latency = self.pick_latency();
        tracing::debug!("Simulated backend latency {:?}", latency);
        tokio::time::sleep(latency).await;
        Ok(self.classifier.classify(utterance, target))
    }
}

/// Limits applied to one backend call.
#[derive(Debug, Clone)]
pub struct ExecutionContract {
    pub timeout: Duration,
}

impl Default for ExecutionContract {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCode {
    Timeout,
    Unavailable,
    Classification,
    Unknown,
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCode::Timeout => write!(f, "timeout"),
            FailureCode::Unavailable => write!(f, "unavailable"),
            FailureCode::Classification => write!(f, "classification"),
            FailureCode::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionError {
    pub code: FailureCode,
    pub message: String,
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ExecutionError {}

impl From<BackendError> for ExecutionError {
    fn from(e: BackendError) -> Self {
        let code = match &e {
            BackendError::Timeout => FailureCode::Timeout,
            BackendError::NotAvailable(_) => FailureCode::Unavailable,
            BackendError::Classification(_) => FailureCode::Classification,
            BackendError::Other(_) => FailureCode::Unknown,
        };
        ExecutionError {
            code,
            message: e.to_string(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run one backend call under `contract`.
///
/// A panic inside the backend is caught here and reported as
/// [`FailureCode::Unknown`]; it never unwinds into the caller.
pub async fn execute_with_contract(
    backend: Arc<dyn Backend>,
    utterance: &str,
    target: Option<&str>,
    contract: &ExecutionContract,
) -> std::result::Result<ClassificationResult, ExecutionError> {
    let call = AssertUnwindSafe(backend.respond(utterance, target)).catch_unwind();

    match tokio::time::timeout(contract.timeout, call).await {
        Ok(Ok(Ok(result))) => Ok(result),
        Ok(Ok(Err(e))) => {
            let err = ExecutionError::from(e);
            tracing::warn!("Backend '{}' failed: {}", backend.name(), err);
            Err(err)
        }
        Ok(Err(payload)) => {
            let reason = panic_message(payload.as_ref());
            tracing::error!("Backend '{}' panicked: {}", backend.name(), reason);
            Err(ExecutionError {
                code: FailureCode::Unknown,
                message: format!("backend panicked: {}", reason),
            })
        }
        Err(_) => {
            tracing::warn!(
                "Backend '{}' exceeded timeout of {:?}",
                backend.name(),
                contract.timeout
            );
            Err(ExecutionError {
                code: FailureCode::Timeout,
                message: format!("no response within {}s", contract.timeout.as_secs_f32()),
            })
        }
    }
}
