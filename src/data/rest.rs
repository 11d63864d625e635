use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{CaseStore, StoreError};
use crate::config::ConfigError;
use crate::consts::{BIDS_TABLE, CASES_TABLE, REST_PATH};
use crate::model::{Bid, ProcurementCase, RecordId};

/// Reads tables through the store's PostgREST endpoint with a read-only key.
pub struct RestStore {
    base: String,
    read_key: String,
    client: reqwest::Client,
}

impl RestStore {
    pub fn new(store_url: &str, read_key: &str) -> Result<Self, ConfigError> {
        Url::parse(store_url).map_err(|e| ConfigError::InvalidUrl {
            key: "store_url",
            value: store_url.to_string(),
            reason: e.to_string(),
        })?;
        if read_key.trim().is_empty() {
            return Err(ConfigError::Missing { key: "read_key" });
        }
        Ok(Self {
            base: store_url.trim_end_matches('/').to_string(),
            read_key: read_key.to_string(),
            client: reqwest::Client::new(),
        })
    }

    fn table_url(&self, table: &str, params: &[(&str, String)]) -> Result<Url, StoreError> {
        let mut url = Url::parse(&format!("{}{}/{}", self.base, REST_PATH, table))
            .map_err(|e| StoreError::Connection(format!("bad table url: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            for (name, value) in params {
                query.append_pair(name, value);
            }
        }
        Ok(url)
    }

    async fn fetch<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, StoreError> {
        debug!(%url, "store read");
        let resp = self
            .client
            .get(url)
            .header("apikey", &self.read_key)
            .header("authorization", format!("Bearer {}", self.read_key))
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "store read rejected");
            return Err(StoreError::Query {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| StoreError::Decode(format!("{e}; raw: {body}")))
    }
}

#[async_trait]
impl CaseStore for RestStore {
    async fn list_cases(&self, phase: Option<&str>) -> Result<Vec<ProcurementCase>, StoreError> {
        let mut params = vec![("select", "*".to_string())];
        if let Some(phase) = phase {
            params.push(("estado_fase", format!("eq.{phase}")));
        }
        let url = self.table_url(CASES_TABLE, &params)?;
        self.fetch(url).await
    }

    async fn list_bids(&self, case_id: &RecordId) -> Result<Vec<Bid>, StoreError> {
        let params = [
            ("select", "*".to_string()),
            ("expediente_id", format!("eq.{case_id}")),
            ("order", "puntaje_total.desc.nullslast".to_string()),
        ];
        let url = self.table_url(BIDS_TABLE, &params)?;
        self.fetch(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_url() {
        let err = RestStore::new("not a url", "key").err().unwrap();
        assert!(matches!(err, ConfigError::InvalidUrl { key: "store_url", .. }));
    }

    #[test]
    fn rejects_blank_key() {
        let err = RestStore::new("https://db.example.com", "  ").err().unwrap();
        assert!(matches!(err, ConfigError::Missing { key: "read_key" }));
    }

    #[test]
    fn table_url_has_rest_prefix_and_filters() {
        let store = RestStore::new("https://db.example.com/", "key").unwrap();
        let url = store
            .table_url(CASES_TABLE, &[("estado_fase", "eq.pending".to_string())])
            .unwrap();
        assert_eq!(url.path(), "/rest/v1/expedientes_contratacion");
        assert_eq!(url.query(), Some("estado_fase=eq.pending"));
    }

    #[test]
    fn table_url_encodes_spaces() {
        let store = RestStore::new("https://db.example.com", "key").unwrap();
        let url = store
            .table_url(CASES_TABLE, &[("estado_fase", "eq.Evaluando Ofertas".to_string())])
            .unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![("estado_fase".to_string(), "eq.Evaluando Ofertas".to_string())]
        );
    }
}
