//! Display formatting for cases and ranked bids.
//!
//! Everything here turns numbers into strings exactly once; the rows
//! coming from the store stay numeric.

pub mod render;

use crate::consts::{CURRENCY_LABEL, format_number};
use crate::model::ProcurementCase;
use crate::ranking::{RankingRow, tied_with_winner, winner};

/// Placeholder for a value the store has not filled in yet.
pub const MISSING: &str = "-";

/// `S/ 1,234,567.89`
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return MISSING.to_string();
    }
    let cents = (amount.abs() * 100.0).round() as u64;
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!(
        "{CURRENCY_LABEL} {sign}{}.{:02}",
        format_number(cents / 100),
        cents % 100
    )
}

/// Score rounded to two decimals.
pub fn format_score(score: f64) -> String {
    if !score.is_finite() {
        return MISSING.to_string();
    }
    format!("{score:.2}")
}

fn amount_or_missing(amount: Option<f64>) -> String {
    amount.map_or_else(|| MISSING.to_string(), format_currency)
}

fn score_or_missing(score: Option<f64>) -> String {
    score.map_or_else(|| MISSING.to_string(), format_score)
}

/// Header facts about the selected case.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseDetail {
    pub process_code: String,
    pub contract_object: String,
    pub estimated_value: String,
}

impl CaseDetail {
    pub fn from_case(case: &ProcurementCase) -> Self {
        Self {
            process_code: case.process_code.clone(),
            contract_object: case.contract_object.clone(),
            estimated_value: amount_or_missing(case.estimated_value),
        }
    }
}

/// One formatted table row.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow {
    pub rank: u32,
    pub bidder: String,
    pub amount: String,
    pub price_score: String,
    pub technical_score: String,
    pub total_score: String,
}

/// The standalone winner panel.
#[derive(Debug, Clone, PartialEq)]
pub enum WinnerSummary {
    Winner {
        bidder: String,
        total_score: String,
        /// Bidders with the same total, placed after the winner by arrival order.
        tied_with: Vec<String>,
    },
    /// Bids exist but none has a total score yet.
    Pending,
    NoBids,
}

/// Ranked results of one case, ready to print.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    pub process_code: String,
    pub rows: Vec<DisplayRow>,
    pub winner: WinnerSummary,
}

impl ResultsView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn results_view(process_code: &str, rows: &[RankingRow]) -> ResultsView {
    let display = rows
        .iter()
        .map(|row| DisplayRow {
            rank: row.rank,
            bidder: row.bid.bidder_name.clone(),
            amount: amount_or_missing(row.bid.offered_amount),
            price_score: score_or_missing(row.bid.price_score),
            technical_score: score_or_missing(row.bid.technical_score),
            total_score: score_or_missing(row.bid.total_score),
        })
        .collect();

    let summary = match winner(rows) {
        Some(top) => WinnerSummary::Winner {
            bidder: top.bid.bidder_name.clone(),
            total_score: score_or_missing(top.bid.total_score),
            tied_with: tied_with_winner(rows)
                .into_iter()
                .map(|row| row.bid.bidder_name.clone())
                .collect(),
        },
        None if rows.is_empty() => WinnerSummary::NoBids,
        None => WinnerSummary::Pending,
    };

    ResultsView {
        process_code: process_code.to_string(),
        rows: display,
        winner: summary,
    }
}
