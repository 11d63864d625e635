//! Read access to the procurement store.
//!
//! [`CaseStore`] is the seam to the external database; [`Repository`]
//! fronts a store with explicit query caches.

pub mod memory;
pub mod rest;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::cache::QueryCache;
use crate::model::{Bid, ProcurementCase, RecordId};

/// Why a store read failed.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not reach the store: {0}")]
    Connection(String),
    #[error("store query failed ({status}): {body}")]
    Query { status: u16, body: String },
    #[error("unexpected row format: {0}")]
    Decode(String),
}

/// Where cases and bids come from. Could be a REST API, memory, etc.
#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Cases, optionally only those in the given phase.
    async fn list_cases(&self, phase: Option<&str>) -> Result<Vec<ProcurementCase>, StoreError>;

    /// Bids of one case, highest total score first.
    async fn list_bids(&self, case_id: &RecordId) -> Result<Vec<Bid>, StoreError>;
}

pub type CaseCache = QueryCache<Option<String>, Vec<ProcurementCase>>;
pub type BidCache = QueryCache<RecordId, Vec<Bid>>;

/// A store plus the caches in front of it. Failed reads are never cached.
pub struct Repository {
    store: Arc<dyn CaseStore>,
    cases: Arc<CaseCache>,
    bids: Arc<BidCache>,
}

impl Repository {
    pub fn new(store: Arc<dyn CaseStore>, cases: Arc<CaseCache>, bids: Arc<BidCache>) -> Self {
        Self { store, cases, bids }
    }

    /// Repository with fresh caches sharing one TTL.
    pub fn with_ttl(store: Arc<dyn CaseStore>, ttl: Duration) -> Self {
        Self::new(
            store,
            Arc::new(QueryCache::new(ttl)),
            Arc::new(QueryCache::new(ttl)),
        )
    }

    pub async fn cases(&self, phase: Option<&str>) -> Result<Vec<ProcurementCase>, StoreError> {
        let key = phase.map(str::to_string);
        if let Some(hit) = self.cases.get(&key).await {
            debug!(phase = ?phase, rows = hit.len(), "cases served from cache");
            return Ok(hit);
        }
        let rows = self.store.list_cases(phase).await?;
        debug!(phase = ?phase, rows = rows.len(), "cases fetched");
        self.cases.set(key, rows.clone()).await;
        Ok(rows)
    }

    pub async fn bids(&self, case_id: &RecordId) -> Result<Vec<Bid>, StoreError> {
        if let Some(hit) = self.bids.get(case_id).await {
            debug!(case = %case_id, rows = hit.len(), "bids served from cache");
            return Ok(hit);
        }
        let rows = self.store.list_bids(case_id).await?;
        debug!(case = %case_id, rows = rows.len(), "bids fetched");
        self.bids.set(case_id.clone(), rows.clone()).await;
        Ok(rows)
    }

    /// Drop every cached read. The next read goes to the store.
    pub async fn invalidate(&self) {
        self.cases.clear().await;
        self.bids.clear().await;
        debug!("query caches cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::InMemoryStore;

    fn repo(store: Arc<InMemoryStore>) -> Repository {
        Repository::with_ttl(store, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn second_read_hits_cache() {
        let store = Arc::new(InMemoryStore::demo());
        let repo = repo(store.clone());

        let first = repo.cases(Some("Evaluando Ofertas")).await.unwrap();
        let second = repo.cases(Some("Evaluando Ofertas")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.reads(), 1);
    }

    #[tokio::test]
    async fn different_phases_cached_separately() {
        let store = Arc::new(InMemoryStore::demo());
        let repo = repo(store.clone());

        repo.cases(Some("Evaluando Ofertas")).await.unwrap();
        repo.cases(None).await.unwrap();

        assert_eq!(store.reads(), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let store = Arc::new(InMemoryStore::demo());
        let repo = repo(store.clone());
        let case_id = RecordId::Int(1);

        repo.bids(&case_id).await.unwrap();
        repo.invalidate().await;
        repo.bids(&case_id).await.unwrap();

        assert_eq!(store.reads(), 2);
    }

    #[tokio::test]
    async fn failed_read_is_not_cached() {
        let store = Arc::new(InMemoryStore::demo());
        let repo = repo(store.clone());

        store.fail_reads("connection refused");
        assert!(repo.cases(None).await.is_err());

        store.recover();
        assert!(!repo.cases(None).await.unwrap().is_empty());
    }
}
