//! Plain-text rendering of a dashboard frame.

use super::{DisplayRow, ResultsView, WinnerSummary};
use crate::dashboard::{Notice, View};

const HEADERS: [&str; 6] = [
    "#",
    "Bidder",
    "Offered amount",
    "Price score",
    "Technical score",
    "Total score",
];

/// Columns that hold numbers and are right-aligned.
const NUMERIC: [bool; 6] = [true, false, true, true, true, true];

fn cells(row: &DisplayRow) -> [String; 6] {
    [
        row.rank.to_string(),
        row.bidder.clone(),
        row.amount.clone(),
        row.price_score.clone(),
        row.technical_score.clone(),
        row.total_score.clone(),
    ]
}

fn pad(text: &str, width: usize, right: bool) -> String {
    let fill = width.saturating_sub(text.chars().count());
    if right {
        format!("{}{text}", " ".repeat(fill))
    } else {
        format!("{text}{}", " ".repeat(fill))
    }
}

fn line(values: &[String], widths: &[usize]) -> String {
    let parts: Vec<String> = values
        .iter()
        .zip(widths)
        .zip(NUMERIC)
        .map(|((v, w), right)| pad(v, *w, right))
        .collect();
    format!("  {}", parts.join("  ").trim_end())
}

/// The ranked bids table, or an explicit empty state.
pub fn render_table(results: &ResultsView) -> String {
    if results.is_empty() {
        return "  no bids have been received for this case\n".to_string();
    }

    let body: Vec<[String; 6]> = results.rows.iter().map(cells).collect();
    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.chars().count()).collect();
    for row in &body {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let headers: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();

    let mut out = String::new();
    out.push_str(&line(&headers, &widths));
    out.push('\n');
    out.push_str(&line(&rule, &widths));
    out.push('\n');
    for row in &body {
        out.push_str(&line(row, &widths));
        out.push('\n');
    }
    out
}

/// The standalone winner panel.
pub fn render_winner(winner: &WinnerSummary) -> String {
    match winner {
        WinnerSummary::Winner {
            bidder,
            total_score,
            tied_with,
        } => {
            let mut out =
                format!("  ★ award recommended to: {bidder} (highest total score, {total_score})\n");
            if !tied_with.is_empty() {
                out.push_str(&format!(
                    "  ! tied on total score with: {}; ranked first by order of receipt\n",
                    tied_with.join(", ")
                ));
            }
            out
        }
        WinnerSummary::Pending => {
            "  no winner yet: bids have not been scored, run /evaluate\n".to_string()
        }
        WinnerSummary::NoBids => String::new(),
    }
}

pub fn render_notice(notice: &Notice) -> String {
    match notice {
        Notice::Info(m) => format!("  · {m}\n"),
        Notice::Success(m) => format!("  ✓ {m}\n"),
        Notice::Warning(m) => format!("  ! {m}\n"),
        Notice::Error { message, payload } => {
            let mut out = format!("  ✗ {message}\n");
            if let Some(payload) = payload {
                let shown = if payload.trim().is_empty() {
                    "(empty body)"
                } else {
                    payload.as_str()
                };
                out.push_str("    raw response:\n");
                for l in shown.lines() {
                    out.push_str(&format!("      {l}\n"));
                }
            }
            out
        }
    }
}

/// One full frame.
pub fn render(view: &View) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{}\n{}\n", view.title, "=".repeat(view.title.chars().count())));

    for notice in &view.notices {
        out.push_str(&render_notice(notice));
    }

    if !view.cases.is_empty() {
        out.push_str("\npending cases:\n");
        for case in &view.cases {
            let marker = if case.selected { "▸" } else { " " };
            out.push_str(&format!("  {marker} {}. {}\n", case.position, case.process_code));
        }
    }

    if let Some(case) = &view.case {
        out.push_str(&format!("\ncase      {}\n", case.process_code));
        out.push_str(&format!("object    {}\n", case.contract_object));
        out.push_str(&format!("estimated {}\n", case.estimated_value));
    }

    if let Some(results) = &view.results {
        out.push_str(&format!("\nevaluation results ({})\n", results.process_code));
        out.push_str(&render_table(results));
        let winner = render_winner(&results.winner);
        if !winner.is_empty() {
            out.push('\n');
            out.push_str(&winner);
        }
    }

    if view.case.is_some() {
        if view.can_evaluate {
            out.push_str("\n  /evaluate to run automatic scoring for this case\n");
        } else {
            out.push_str("\n  (automatic scoring unavailable)\n");
        }
    }
    out
}
