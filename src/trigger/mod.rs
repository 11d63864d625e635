//! Scoring trigger.
//!
//! A [`Scorer`] asks the external service to score a case. The
//! [`Evaluator`] wraps a scorer with the call policy: one call in flight
//! at a time, and a bounded wait.

pub mod edge;
pub mod mock;
pub mod simulated;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::ConfigError;
use crate::model::RecordId;

/// Why an evaluation request did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("scoring trigger unavailable: {0}")]
    NotConfigured(#[from] ConfigError),
    #[error("an evaluation is already in progress")]
    Busy,
    #[error("could not reach the scoring service: {0}")]
    Network(String),
    #[error("scoring service did not answer within {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("scoring service rejected the request (HTTP {status})")]
    Rejected { status: u16, body: String },
    #[error("scoring service returned a malformed payload: {reason}")]
    Malformed { body: String, reason: String },
}

impl TriggerError {
    /// The response body as received, for diagnosis.
    pub fn raw_payload(&self) -> Option<&str> {
        match self {
            TriggerError::Rejected { body, .. } | TriggerError::Malformed { body, .. } => {
                Some(body)
            }
            _ => None,
        }
    }
}

/// A successful scoring run, as reported by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReceipt {
    pub case_id: RecordId,
    pub payload: serde_json::Value,
}

impl EvaluationReceipt {
    /// A human-readable message from the payload, if it carries one.
    pub fn message(&self) -> Option<&str> {
        self.payload.get("message").and_then(|v| v.as_str())
    }
}

/// Whatever performs the scoring. Could be the hosted function, a
/// simulation, or a test script.
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn evaluate(&self, case_id: &RecordId) -> Result<EvaluationReceipt, TriggerError>;
}

/// Clears the in-flight flag when the call finishes or is dropped.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Runs scorer calls one at a time with a timeout. Never retries.
#[derive(Clone)]
pub struct Evaluator {
    scorer: Result<Arc<dyn Scorer>, ConfigError>,
    in_flight: Arc<AtomicBool>,
    timeout: Duration,
}

impl Evaluator {
    pub fn new(scorer: Arc<dyn Scorer>, timeout: Duration) -> Self {
        Self {
            scorer: Ok(scorer),
            in_flight: Arc::new(AtomicBool::new(false)),
            timeout,
        }
    }

    /// An evaluator that reports `reason` on every call.
    pub fn unconfigured(reason: ConfigError) -> Self {
        Self {
            scorer: Err(reason),
            in_flight: Arc::new(AtomicBool::new(false)),
            timeout: Duration::ZERO,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.scorer.is_ok()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub async fn evaluate(&self, case_id: &RecordId) -> Result<EvaluationReceipt, TriggerError> {
        let scorer = self.scorer.as_ref().map_err(|e| e.clone())?;

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!(case = %case_id, "evaluation refused, another one is in flight");
            return Err(TriggerError::Busy);
        }
        let _guard = InFlight(Arc::clone(&self.in_flight));

        info!(case = %case_id, "evaluation requested");
        let result = match tokio::time::timeout(self.timeout, scorer.evaluate(case_id)).await {
            Ok(result) => result,
            Err(_) => Err(TriggerError::Timeout(self.timeout)),
        };

        match &result {
            Ok(_) => info!(case = %case_id, "evaluation completed"),
            Err(e) => warn!(case = %case_id, error = %e, "evaluation failed"),
        }
        result
    }
}
