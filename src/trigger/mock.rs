use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{EvaluationReceipt, Scorer, TriggerError};
use crate::model::RecordId;

/// What a [`ScriptedScorer`] answers on one call.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    Success(serde_json::Value),
    /// Succeed after sleeping.
    Delayed(Duration, serde_json::Value),
    Rejected { status: u16, body: String },
    Malformed(String),
    Unreachable(String),
}

type SuccessHook = Box<dyn Fn(&RecordId) + Send + Sync>;

/// A scripted scorer for tests. Returns pre-defined outcomes in order.
pub struct ScriptedScorer {
    outcomes: Vec<ScriptedOutcome>,
    calls: Mutex<Vec<RecordId>>,
    on_success: Option<SuccessHook>,
}

impl ScriptedScorer {
    pub fn new(outcomes: Vec<ScriptedOutcome>) -> Self {
        Self {
            outcomes,
            calls: Mutex::new(Vec::new()),
            on_success: None,
        }
    }

    /// Run `hook` after each successful call, e.g. to update a store the
    /// way the real service would.
    pub fn on_success(mut self, hook: impl Fn(&RecordId) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(hook));
        self
    }

    /// Case ids this scorer was called with, in order.
    pub fn calls(&self) -> Vec<RecordId> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Scorer for ScriptedScorer {
    async fn evaluate(&self, case_id: &RecordId) -> Result<EvaluationReceipt, TriggerError> {
        let index = {
            let mut calls = self
                .calls
                .lock()
                .map_err(|_| TriggerError::Network("scripted scorer poisoned".to_string()))?;
            calls.push(case_id.clone());
            calls.len() - 1
        };
        let outcome = self.outcomes.get(index).cloned().ok_or_else(|| {
            TriggerError::Network(format!(
                "ScriptedScorer: no more outcomes (called {} times)",
                index + 1
            ))
        })?;

        let payload = match outcome {
            ScriptedOutcome::Success(payload) => payload,
            ScriptedOutcome::Delayed(delay, payload) => {
                tokio::time::sleep(delay).await;
                payload
            }
            ScriptedOutcome::Rejected { status, body } => {
                return Err(TriggerError::Rejected { status, body });
            }
            ScriptedOutcome::Malformed(body) => {
                return Err(TriggerError::Malformed {
                    body,
                    reason: "scripted".to_string(),
                });
            }
            ScriptedOutcome::Unreachable(reason) => return Err(TriggerError::Network(reason)),
        };

        if let Some(hook) = &self.on_success {
            hook(case_id);
        }
        Ok(EvaluationReceipt {
            case_id: case_id.clone(),
            payload,
        })
    }
}
