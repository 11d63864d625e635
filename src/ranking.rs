//! Bid ranking.
//!
//! Ranks are dense and sequential by sorted position: the highest total
//! score gets 1, the next gets 2, and so on with no gaps or shared
//! ranks. The sort is stable, so bids with equal totals keep the order
//! they arrived in. Bids without a total score go last.

use std::cmp::Ordering;

use crate::model::Bid;

/// A bid with its position in the ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingRow {
    pub rank: u32,
    pub bid: Bid,
}

/// Order two optional totals, highest first, missing last. A non-finite
/// total counts as missing.
fn by_total_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    let finite = |t: Option<f64>| t.filter(|n| n.is_finite());
    match (finite(a), finite(b)) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Rank the bids of one case.
pub fn rank_bids(mut bids: Vec<Bid>) -> Vec<RankingRow> {
    bids.sort_by(|a, b| by_total_desc(a.total_score, b.total_score));
    bids.into_iter()
        .zip(1u32..)
        .map(|(bid, rank)| RankingRow { rank, bid })
        .collect()
}

/// The rank-1 row, if it has been scored.
pub fn winner(rows: &[RankingRow]) -> Option<&RankingRow> {
    rows.first()
        .filter(|row| row.rank == 1 && row.bid.total_score.is_some_and(f64::is_finite))
}

/// Rows other than the winner whose total equals the winner's.
pub fn tied_with_winner(rows: &[RankingRow]) -> Vec<&RankingRow> {
    let Some(top) = winner(rows) else {
        return Vec::new();
    };
    rows.iter()
        .skip(1)
        .filter(|row| row.bid.total_score == top.bid.total_score)
        .collect()
}
