//! The dashboard as an explicit state machine.
//!
//! Every operator action goes through [`Dashboard::update`], which
//! applies the action, runs one full read-rank-format pass, and returns
//! a [`View`]. Notices live for one pass only. Any binding (the REPL in
//! `main.rs`, a web handler, a TUI) drives the dashboard the same way.

use tracing::debug;

use crate::config::ConfigError;
use crate::data::Repository;
use crate::model::{ProcurementCase, RecordId};
use crate::present::{CaseDetail, ResultsView, results_view};
use crate::ranking::rank_bids;
use crate::trigger::{Evaluator, TriggerError};

/// Something the operator did.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Re-run the pass with the current selection.
    Rerun,
    /// Select a case by process code or by its 1-based position in the list.
    Select(String),
    /// Ask the external service to score the selected case.
    Evaluate,
    /// Drop cached reads, then re-run.
    Refresh,
}

/// A message shown above the results for one pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Info(String),
    Success(String),
    Warning(String),
    Error {
        message: String,
        /// Raw response body, when there is one.
        payload: Option<String>,
    },
}

impl Notice {
    fn error(message: impl Into<String>) -> Self {
        Notice::Error {
            message: message.into(),
            payload: None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error { .. })
    }
}

/// Case list shown in the selector.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseOption {
    pub position: usize,
    pub process_code: String,
    pub selected: bool,
}

/// Everything a binding needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub title: String,
    pub cases: Vec<CaseOption>,
    pub case: Option<CaseDetail>,
    pub results: Option<ResultsView>,
    pub notices: Vec<Notice>,
    /// Whether the evaluate control should be offered.
    pub can_evaluate: bool,
}

/// State that survives between passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub cases: Vec<ProcurementCase>,
    pub selected: Option<RecordId>,
}

impl DashboardState {
    pub fn selected_case(&self) -> Option<&ProcurementCase> {
        let id = self.selected.as_ref()?;
        self.cases.iter().find(|c| &c.id == id)
    }

    /// Resolve operator input to a case: exact code, then list position.
    pub fn find_case(&self, input: &str) -> Option<&ProcurementCase> {
        let input = input.trim().trim_start_matches('#');
        self.cases
            .iter()
            .find(|c| c.process_code == input)
            .or_else(|| {
                self.cases
                    .iter()
                    .find(|c| c.process_code.eq_ignore_ascii_case(input))
            })
            .or_else(|| {
                let position: usize = input.parse().ok()?;
                self.cases.get(position.checked_sub(1)?)
            })
    }
}

pub struct Dashboard {
    title: String,
    phase: String,
    data: Result<Repository, ConfigError>,
    evaluator: Evaluator,
    state: DashboardState,
}

impl Dashboard {
    pub fn new(
        title: impl Into<String>,
        phase: impl Into<String>,
        data: Result<Repository, ConfigError>,
        evaluator: Evaluator,
    ) -> Self {
        Self {
            title: title.into(),
            phase: phase.into(),
            data,
            evaluator,
            state: DashboardState::default(),
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn is_evaluating(&self) -> bool {
        self.evaluator.is_busy()
    }

    /// Apply one action and render the resulting frame.
    pub async fn update(&mut self, action: Action) -> View {
        debug!(?action, "dashboard update");
        let mut notices = Vec::new();

        match &action {
            Action::Rerun => {}
            Action::Refresh => {
                if let Ok(repo) = &self.data {
                    repo.invalidate().await;
                }
                notices.push(Notice::Info("cached data cleared".to_string()));
            }
            // Resolved against the freshest case list in the pass below.
            Action::Select(_) => {}
            Action::Evaluate => self.evaluate(&mut notices).await,
        }

        self.render_pass(action, notices).await
    }

    /// Select a case for a single non-interactive frame. Returns the frame
    /// and whether `input` matched. Without a match the frame only lists
    /// the pending cases, it never falls back to another case.
    pub async fn select_only(&mut self, input: &str) -> (View, bool) {
        let mut view = self.update(Action::Select(input.to_string())).await;
        let matched = self.state.find_case(input).is_some();
        if !matched {
            view.case = None;
            view.results = None;
            view.can_evaluate = false;
            for option in &mut view.cases {
                option.selected = false;
            }
        }
        (view, matched)
    }

    async fn evaluate(&mut self, notices: &mut Vec<Notice>) {
        let Some(case) = self.state.selected_case().cloned() else {
            notices.push(Notice::Warning(
                "select a case before running the evaluation".to_string(),
            ));
            return;
        };

        notices.push(Notice::Info(format!(
            "evaluating {} with the scoring service...",
            case.process_code
        )));

        match self.evaluator.evaluate(&case.id).await {
            Ok(receipt) => {
                if let Ok(repo) = &self.data {
                    repo.invalidate().await;
                }
                let detail = receipt
                    .message()
                    .map(|m| format!(": {m}"))
                    .unwrap_or_default();
                notices.push(Notice::Success(format!(
                    "evaluation of {} completed{detail}. results refreshed.",
                    case.process_code
                )));
            }
            Err(TriggerError::Busy) => {
                notices.push(Notice::Warning(
                    "an evaluation is already running, wait for it to finish".to_string(),
                ));
            }
            Err(e) => {
                let payload = e.raw_payload().map(str::to_string);
                notices.push(Notice::Error {
                    message: format!("evaluation of {} failed: {e}", case.process_code),
                    payload,
                });
            }
        }
    }

    async fn render_pass(&mut self, action: Action, mut notices: Vec<Notice>) -> View {
        let repo = match &self.data {
            Ok(repo) => repo,
            Err(e) => {
                notices.push(Notice::error(format!("cannot read the store: {e}")));
                return self.view(notices, None, None);
            }
        };

        self.state.cases = match repo.cases(Some(&self.phase)).await {
            Ok(cases) => cases,
            Err(e) => {
                notices.push(Notice::error(format!("could not load cases: {e}")));
                Vec::new()
            }
        };

        if let Action::Select(input) = &action {
            match self.state.find_case(input).map(|c| c.id.clone()) {
                Some(id) => self.state.selected = Some(id),
                None => notices.push(Notice::Warning(format!("no pending case matches {input:?}"))),
            }
        }

        if self.state.cases.is_empty() {
            self.state.selected = None;
            if !notices.iter().any(Notice::is_error) {
                notices.push(Notice::Warning(format!(
                    "no cases are pending evaluation (phase {:?})",
                    self.phase
                )));
            }
            return self.view(notices, None, None);
        }

        // A selection that dropped out of the pending list falls back to the first case.
        if self.state.selected_case().is_none() {
            self.state.selected = self.state.cases.first().map(|c| c.id.clone());
        }
        let Some(case) = self.state.selected_case().cloned() else {
            return self.view(notices, None, None);
        };

        // A failed read shows no table, so it is never mistaken for a case without bids.
        let results = match repo.bids(&case.id).await {
            Ok(bids) => Some(results_view(&case.process_code, &rank_bids(bids))),
            Err(e) => {
                notices.push(Notice::error(format!(
                    "could not load bids for {}: {e}",
                    case.process_code
                )));
                None
            }
        };

        self.view(notices, Some(CaseDetail::from_case(&case)), results)
    }

    fn view(
        &self,
        notices: Vec<Notice>,
        case: Option<CaseDetail>,
        results: Option<ResultsView>,
    ) -> View {
        let cases = self
            .state
            .cases
            .iter()
            .enumerate()
            .map(|(i, c)| CaseOption {
                position: i + 1,
                process_code: c.process_code.clone(),
                selected: self.state.selected.as_ref() == Some(&c.id),
            })
            .collect();

        View {
            title: self.title.clone(),
            cases,
            can_evaluate: case.is_some()
                && self.evaluator.is_configured()
                && !self.evaluator.is_busy(),
            case,
            results,
            notices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::consts::DEFAULT_PENDING_PHASE;
    use crate::data::memory::InMemoryStore;
    use crate::present::WinnerSummary;
    use crate::trigger::simulated::SimulatedScorer;

    fn demo_dashboard() -> (Dashboard, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::demo());
        let repo = Repository::with_ttl(store.clone(), Duration::from_secs(60));
        let evaluator = Evaluator::new(
            Arc::new(SimulatedScorer::new(Duration::ZERO)),
            Duration::from_secs(5),
        );
        (
            Dashboard::new("Test", DEFAULT_PENDING_PHASE, Ok(repo), evaluator),
            store,
        )
    }

    #[tokio::test]
    async fn first_pass_selects_first_case() {
        let (mut dashboard, _) = demo_dashboard();
        let view = dashboard.update(Action::Rerun).await;

        assert_eq!(view.cases.len(), 2);
        assert!(view.cases[0].selected);
        let results = view.results.unwrap();
        assert_eq!(results.process_code, "LP-SM-4-2024-MDC-1");
        assert!(matches!(results.winner, WinnerSummary::Winner { .. }));
        assert!(view.can_evaluate);
    }

    #[tokio::test]
    async fn select_by_position_and_code() {
        let (mut dashboard, _) = demo_dashboard();
        dashboard.update(Action::Rerun).await;

        let view = dashboard.update(Action::Select("2".to_string())).await;
        assert_eq!(view.case.unwrap().process_code, "AS-SM-12-2024-MDC-1");

        let view = dashboard
            .update(Action::Select("lp-sm-4-2024-mdc-1".to_string()))
            .await;
        assert_eq!(view.case.unwrap().process_code, "LP-SM-4-2024-MDC-1");
    }

    #[tokio::test]
    async fn unknown_selection_warns_and_keeps_current() {
        let (mut dashboard, _) = demo_dashboard();
        dashboard.update(Action::Select("2".to_string())).await;
        let view = dashboard.update(Action::Select("nope".to_string())).await;

        assert!(view
            .notices
            .iter()
            .any(|n| matches!(n, Notice::Warning(m) if m.contains("nope"))));
        assert_eq!(view.case.unwrap().process_code, "AS-SM-12-2024-MDC-1");
    }

    #[tokio::test]
    async fn select_only_without_match_shows_no_case() {
        let (mut dashboard, _) = demo_dashboard();

        let (view, matched) = dashboard.select_only("BOGUS").await;

        assert!(!matched);
        assert!(view.case.is_none());
        assert!(view.results.is_none());
        assert!(!view.can_evaluate);
        assert_eq!(view.cases.len(), 2);
        assert!(view.cases.iter().all(|c| !c.selected));
        assert!(view
            .notices
            .iter()
            .any(|n| matches!(n, Notice::Warning(m) if m.contains("BOGUS"))));
        assert!(!crate::present::render::render(&view).contains("award recommended"));
    }

    #[tokio::test]
    async fn select_only_with_match_shows_case() {
        let (mut dashboard, _) = demo_dashboard();
        let (view, matched) = dashboard.select_only("AS-SM-12-2024-MDC-1").await;
        assert!(matched);
        assert_eq!(view.case.unwrap().process_code, "AS-SM-12-2024-MDC-1");
        assert!(view.results.is_some());
    }

    #[tokio::test]
    async fn unscored_case_has_pending_winner() {
        let (mut dashboard, _) = demo_dashboard();
        let view = dashboard.update(Action::Select("2".to_string())).await;
        assert_eq!(view.results.unwrap().winner, WinnerSummary::Pending);
    }

    #[tokio::test]
    async fn store_failure_degrades_to_empty() {
        let (mut dashboard, store) = demo_dashboard();
        store.fail_reads("connection refused");

        let view = dashboard.update(Action::Rerun).await;

        assert!(view.cases.is_empty());
        assert!(view.results.is_none());
        assert!(!view.can_evaluate);
        assert!(view.notices.iter().any(Notice::is_error));
    }

    #[tokio::test]
    async fn failed_bid_read_is_not_an_empty_case() {
        let (mut dashboard, store) = demo_dashboard();
        dashboard.update(Action::Rerun).await;
        store.fail_reads("connection reset");

        // Cases come from the cache, the bids of case 2 do not.
        let view = dashboard.update(Action::Select("2".to_string())).await;

        assert_eq!(view.case.as_ref().unwrap().process_code, "AS-SM-12-2024-MDC-1");
        assert!(view.results.is_none());
        assert!(view.notices.iter().any(Notice::is_error));
        let text = crate::present::render::render(&view);
        assert!(text.contains("connection reset"));
        assert!(!text.contains("no bids"));
    }

    #[tokio::test]
    async fn missing_store_config_is_inline_error() {
        let evaluator = Evaluator::unconfigured(ConfigError::Missing { key: "write_key" });
        let mut dashboard = Dashboard::new(
            "Test",
            DEFAULT_PENDING_PHASE,
            Err(ConfigError::Missing { key: "store_url" }),
            evaluator,
        );
        let view = dashboard.update(Action::Rerun).await;
        match &view.notices[..] {
            [Notice::Error { message, .. }] => assert!(message.contains("store_url")),
            other => panic!("unexpected notices: {other:?}"),
        }
    }

    #[tokio::test]
    async fn evaluate_without_cases_warns() {
        let (mut dashboard, store) = demo_dashboard();
        store.fail_reads("down");
        let view = dashboard.update(Action::Evaluate).await;
        assert!(view
            .notices
            .iter()
            .any(|n| matches!(n, Notice::Warning(m) if m.contains("select a case"))));
    }

    #[tokio::test]
    async fn refresh_clears_cache() {
        let (mut dashboard, store) = demo_dashboard();
        dashboard.update(Action::Rerun).await;
        let reads = store.reads();

        dashboard.update(Action::Rerun).await;
        assert_eq!(store.reads(), reads);

        dashboard.update(Action::Refresh).await;
        assert_eq!(store.reads(), reads + 2);
    }

    #[test]
    fn find_case_accepts_hash_prefix() {
        let state = DashboardState {
            cases: vec![ProcurementCase {
                id: RecordId::Int(1),
                process_code: "LP-1".to_string(),
                contract_object: String::new(),
                estimated_value: None,
                phase_status: String::new(),
            }],
            selected: None,
        };
        assert!(state.find_case("#1").is_some());
        assert!(state.find_case("0").is_none());
        assert!(state.find_case("2").is_none());
    }
}
