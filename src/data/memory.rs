use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{CaseStore, StoreError};
use crate::consts::DEFAULT_PENDING_PHASE;
use crate::model::{Bid, ProcurementCase, RecordId};

#[derive(Default)]
struct Tables {
    cases: Vec<ProcurementCase>,
    bids: Vec<Bid>,
    failure: Option<String>,
}

/// A store held in process memory. Backs `--demo` and the tests.
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    reads: AtomicUsize,
}

impl InMemoryStore {
    pub fn new(cases: Vec<ProcurementCase>, bids: Vec<Bid>) -> Self {
        Self {
            tables: Mutex::new(Tables {
                cases,
                bids,
                failure: None,
            }),
            reads: AtomicUsize::new(0),
        }
    }

    /// Two pending cases (one scored, one not yet) and one closed case.
    pub fn demo() -> Self {
        let case = |id: i64, code: &str, object: &str, value: f64, phase: &str| ProcurementCase {
            id: RecordId::Int(id),
            process_code: code.to_string(),
            contract_object: object.to_string(),
            estimated_value: Some(value),
            phase_status: phase.to_string(),
        };
        let bid = |id: i64, case_id: i64, name: &str, amount: f64, scores: Option<(f64, f64, f64)>| {
            Bid {
                id: RecordId::Int(id),
                case_id: RecordId::Int(case_id),
                bidder_name: name.to_string(),
                offered_amount: Some(amount),
                price_score: scores.map(|s| s.0),
                technical_score: scores.map(|s| s.1),
                total_score: scores.map(|s| s.2),
            }
        };

        Self::new(
            vec![
                case(
                    1,
                    "LP-SM-4-2024-MDC-1",
                    "Mejoramiento del camino vecinal Huanca - Pampas",
                    2_450_000.0,
                    DEFAULT_PENDING_PHASE,
                ),
                case(
                    2,
                    "AS-SM-12-2024-MDC-1",
                    "Adquisición de equipos de cómputo",
                    380_500.0,
                    DEFAULT_PENDING_PHASE,
                ),
                case(
                    3,
                    "CP-SM-2-2024-MDC-1",
                    "Supervisión de obra",
                    190_000.0,
                    "Buena Pro Consentida",
                ),
            ],
            vec![
                bid(10, 1, "Constructora Andina S.A.C.", 2_310_000.0, Some((100.0, 82.5, 89.75))),
                bid(11, 1, "Consorcio Vial del Sur", 2_395_500.0, Some((96.43, 91.0, 93.17))),
                bid(12, 1, "Ingeniería y Obras Pampas E.I.R.L.", 2_448_000.0, Some((94.36, 78.0, 84.54))),
                bid(20, 2, "Tecnología Integral S.A.", 365_000.0, None),
                bid(21, 2, "Distribuidora Lima Norte S.R.L.", 372_900.0, None),
                bid(30, 3, "Supervisores Asociados S.A.C.", 185_000.0, Some((100.0, 90.0, 94.0))),
            ],
        )
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// How many list calls reached the store.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Make every read fail with a connection error until [`recover`](Self::recover).
    pub fn fail_reads(&self, message: &str) {
        self.tables().failure = Some(message.to_string());
    }

    pub fn recover(&self) {
        self.tables().failure = None;
    }

    /// Overwrite the scores of one bid, as the external scorer does.
    /// Returns false if no such bid exists.
    pub fn set_scores(&self, bid_id: &RecordId, price: f64, technical: f64, total: f64) -> bool {
        let mut tables = self.tables();
        match tables.bids.iter_mut().find(|b| &b.id == bid_id) {
            Some(bid) => {
                bid.price_score = Some(price);
                bid.technical_score = Some(technical);
                bid.total_score = Some(total);
                true
            }
            None => false,
        }
    }

    fn begin_read(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables();
        match &tables.failure {
            Some(message) => Err(StoreError::Connection(message.clone())),
            None => Ok(tables),
        }
    }
}

#[async_trait]
impl CaseStore for InMemoryStore {
    async fn list_cases(&self, phase: Option<&str>) -> Result<Vec<ProcurementCase>, StoreError> {
        let tables = self.begin_read()?;
        Ok(tables
            .cases
            .iter()
            .filter(|c| phase.is_none_or(|p| c.phase_status == p))
            .cloned()
            .collect())
    }

    async fn list_bids(&self, case_id: &RecordId) -> Result<Vec<Bid>, StoreError> {
        let tables = self.begin_read()?;
        let mut bids: Vec<Bid> = tables
            .bids
            .iter()
            .filter(|b| &b.case_id == case_id)
            .cloned()
            .collect();
        // Same order the REST store asks for: total desc, nulls last.
        bids.sort_by(|a, b| match (a.total_score, b.total_score) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        Ok(bids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn filters_cases_by_phase() {
        let store = InMemoryStore::demo();
        let pending = store.list_cases(Some(DEFAULT_PENDING_PHASE)).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().all(|c| c.phase_status == DEFAULT_PENDING_PHASE));

        let all = store.list_cases(None).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn bids_ordered_by_total_desc() {
        let store = InMemoryStore::demo();
        let bids = store.list_bids(&RecordId::Int(1)).await.unwrap();
        let totals: Vec<f64> = bids.iter().filter_map(|b| b.total_score).collect();
        assert_eq!(totals, vec![93.17, 89.75, 84.54]);
    }

    #[tokio::test]
    async fn unknown_case_has_no_bids() {
        let store = InMemoryStore::demo();
        assert!(store.list_bids(&RecordId::Int(99)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_scores_updates_reads() {
        let store = InMemoryStore::demo();
        assert!(store.set_scores(&RecordId::Int(20), 100.0, 70.0, 82.0));
        let bids = store.list_bids(&RecordId::Int(2)).await.unwrap();
        assert_eq!(bids[0].id, RecordId::Int(20));
        assert_eq!(bids[0].total_score, Some(82.0));
    }

    #[test]
    fn set_scores_unknown_bid() {
        let store = InMemoryStore::demo();
        assert!(!store.set_scores(&RecordId::Int(999), 1.0, 1.0, 1.0));
    }

    #[tokio::test]
    async fn failure_mode_counts_reads() {
        let store = InMemoryStore::demo();
        store.fail_reads("down");
        let err = store.list_cases(None).await.unwrap_err();
        assert!(err.to_string().contains("down"));
        assert_eq!(store.reads(), 1);
    }
}
