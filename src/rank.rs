use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::aggregate::AggregatedRow;

/// Rows shown on the leaderboard.
pub const LEADERBOARD_SIZE: usize = 20;

/// An aggregated row with its competition rank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRow {
    #[serde(flatten)]
    pub row: AggregatedRow,
    pub rank: u32,
}

fn by_share_desc(a: &AggregatedRow, b: &AggregatedRow) -> Ordering {
    b.share
        .total_cmp(&a.share)
        .then_with(|| a.brand.cmp(&b.brand))
        .then_with(|| a.event.cmp(&b.event))
}

/// Sort by share descending and assign standard competition ranks
/// ("1224"): equal shares share a rank, and the next distinct share is
/// ranked one past the number of rows strictly ahead of it.
///
/// Ties are listed in brand order so the output is deterministic.
pub fn competition_rank(mut rows: Vec<AggregatedRow>) -> Vec<RankedRow> {
    rows.sort_by(by_share_desc);

    let mut ranked: Vec<RankedRow> = Vec::with_capacity(rows.len());
    for (position, row) in rows.into_iter().enumerate() {
        let rank = match ranked.last() {
            Some(prev) if prev.row.share == row.share => prev.rank,
            _ => position as u32 + 1,
        };
        ranked.push(RankedRow { row, rank });
    }
    ranked
}

/// Rank rows from a single year and keep the first `k`.
pub fn leaderboard(rows: Vec<AggregatedRow>, k: usize) -> Vec<RankedRow> {
    let mut ranked = competition_rank(rows);
    ranked.truncate(k);
    ranked
}

/// One brand's standing in one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankPoint {
    pub year: i32,
    /// Set when the ranked row is event-scoped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    /// `None` when the brand has no data that year.
    pub rank: Option<u32>,
    pub share: Option<f64>,
}

/// Rank every row of each year together, then pull out `brand`'s
/// positions.
///
/// Event-scoped rows of one year share a single ranking, the same one the
/// leaderboard uses, so a brand can appear once per event in a year. Rows
/// without a year are ignored. Years where `brand` is absent are reported
/// with `rank: None` rather than dropped.
pub fn rank_trajectory(rows: &[AggregatedRow], brand: &str) -> Vec<RankPoint> {
    let mut years: BTreeMap<i32, Vec<AggregatedRow>> = BTreeMap::new();
    for row in rows {
        if let Some(year) = row.year {
            years.entry(year).or_default().push(row.clone());
        }
    }

    let mut points = Vec::new();
    for (year, members) in years {
        let before = points.len();
        points.extend(
            competition_rank(members)
                .into_iter()
                .filter(|r| r.row.brand == brand)
                .map(|r| RankPoint {
                    year,
                    rank: Some(r.rank),
                    share: Some(r.row.share),
                    event: r.row.event,
                }),
        );
        if points.len() == before {
            points.push(RankPoint {
                year,
                event: None,
                rank: None,
                share: None,
            });
        }
    }
    points
}
