use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::{EvaluationReceipt, Scorer, TriggerError};
use crate::model::RecordId;

/// Acknowledges every request without contacting anything. Scores in the
/// store are left as they are. Used by `--demo`.
pub struct SimulatedScorer {
    latency: Duration,
}

impl SimulatedScorer {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl Scorer for SimulatedScorer {
    async fn evaluate(&self, case_id: &RecordId) -> Result<EvaluationReceipt, TriggerError> {
        debug!(case = %case_id, "simulated evaluation");
        tokio::time::sleep(self.latency).await;
        Ok(EvaluationReceipt {
            case_id: case_id.clone(),
            payload: json!({
                "simulated": true,
                "expediente_id": case_id,
                "message": "simulated evaluation, scores unchanged",
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_succeeds() {
        let scorer = SimulatedScorer::new(Duration::ZERO);
        let receipt = scorer.evaluate(&RecordId::Int(4)).await.unwrap();
        assert_eq!(receipt.case_id, RecordId::Int(4));
        assert_eq!(receipt.payload["expediente_id"], 4);
        assert_eq!(receipt.payload["simulated"], true);
        assert!(receipt.message().is_some());
    }
}
