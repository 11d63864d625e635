use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Serialize;
use tracing::debug;

use super::{EvaluationReceipt, Scorer, TriggerError};
use crate::config::{ConfigError, DashboardConfig};
use crate::model::RecordId;

/// Calls the hosted scoring function with a write-authorized key.
pub struct EdgeFunctionScorer {
    endpoint: String,
    write_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct TriggerRequest<'a> {
    expediente_id: &'a RecordId,
}

impl EdgeFunctionScorer {
    pub fn new(endpoint: &str, write_key: &str) -> Result<Self, ConfigError> {
        Url::parse(endpoint).map_err(|e| ConfigError::InvalidUrl {
            key: "trigger_endpoint",
            value: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        if write_key.trim().is_empty() {
            return Err(ConfigError::Missing { key: "write_key" });
        }
        Ok(Self {
            endpoint: endpoint.to_string(),
            write_key: write_key.to_string(),
            client: reqwest::Client::new(),
        })
    }

    pub fn from_config(config: &DashboardConfig) -> Result<Self, ConfigError> {
        let endpoint = config.trigger_url()?;
        let write_key = config.write_key()?;
        Self::new(&endpoint, write_key)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Scorer for EdgeFunctionScorer {
    async fn evaluate(&self, case_id: &RecordId) -> Result<EvaluationReceipt, TriggerError> {
        debug!(endpoint = %self.endpoint, case = %case_id, "posting evaluation request");
        let resp = self
            .client
            .post(&self.endpoint)
            .header("authorization", format!("Bearer {}", self.write_key))
            .header("content-type", "application/json")
            .json(&TriggerRequest {
                expediente_id: case_id,
            })
            .send()
            .await
            .map_err(|e| TriggerError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| TriggerError::Network(e.to_string()))?;
        debug!(status = status.as_u16(), bytes = body.len(), "scoring service answered");

        if status != StatusCode::OK {
            return Err(TriggerError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        match serde_json::from_str(&body) {
            Ok(payload) => Ok(EvaluationReceipt {
                case_id: case_id.clone(),
                payload,
            }),
            Err(e) => Err(TriggerError::Malformed {
                body,
                reason: e.to_string(),
            }),
        }
    }
}
