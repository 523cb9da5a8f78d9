use serde::Serialize;

use crate::aggregate::AggregatedRow;
use crate::category::CategoryShare;
use crate::dataset::{BrandType, Cohort};
use crate::rank::{RankPoint, RankedRow};
use crate::trend::TrendSummary;

/// The filter a dashboard was computed under.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySummary {
    pub events: Vec<String>,
    pub min_year: i32,
    pub max_year: i32,
    pub cohort: Cohort,
    pub aggregate_events: bool,
    /// Rows of the base relation that passed the filter.
    pub rows_matched: usize,
}

/// One leaderboard line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub brand: String,
    pub name_en: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    pub brand_type: BrandType,
    pub category: &'static str,
    pub share: f64,
    /// `share` as a percentage rounded to one decimal.
    pub share_pct: f64,
}

impl From<RankedRow> for LeaderboardEntry {
    fn from(r: RankedRow) -> Self {
        Self {
            rank: r.rank,
            brand_type: r.row.brand_type,
            category: r.row.brand_type.label_local(),
            share_pct: (r.row.share * 1000.0).round() / 10.0,
            share: r.row.share,
            brand: r.row.brand,
            name_en: r.row.name_en,
            event: r.row.event,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaderboard {
    /// Year the leaderboard was computed for (the end of the year range).
    pub year: i32,
    pub entries: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trends {
    pub selected_brands: Vec<String>,
    pub series: Vec<AggregatedRow>,
    pub summaries: Vec<TrendSummary>,
}

impl Trends {
    pub fn summary_text(&self) -> String {
        self.summaries
            .iter()
            .map(TrendSummary::line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Share and rank history of a single brand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FocusPanel {
    pub brand: String,
    pub shares: Vec<AggregatedRow>,
    pub ranks: Vec<RankPoint>,
}

impl FocusPanel {
    pub fn start_share(&self) -> Option<f64> {
        self.shares.first().map(|r| r.share)
    }

    pub fn end_share(&self) -> Option<f64> {
        self.shares.last().map(|r| r.share)
    }

    /// First partition in which the brand was ranked.
    pub fn start_rank(&self) -> Option<u32> {
        self.ranks.iter().find_map(|p| p.rank)
    }

    /// Last partition in which the brand was ranked.
    pub fn end_rank(&self) -> Option<u32> {
        self.ranks.iter().rev().find_map(|p| p.rank)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionReport {
    pub series: Vec<CategoryShare>,
    pub latest_year: i32,
    /// Domestic total at `latest_year`, `0.0` when absent.
    pub latest_domestic: f64,
    /// `1 - latest_domestic`.
    pub latest_international: f64,
}

/// Every output the rendering layer consumes for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub query: QuerySummary,
    pub leaderboard: Leaderboard,
    pub trends: Trends,
    pub focus: FocusPanel,
    pub composition: CompositionReport,
}

/// Distinct values present in a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    pub rows: usize,
    pub fingerprint: String,
    pub events: Vec<String>,
    pub years: Vec<i32>,
    /// Row count per cohort.
    pub cohorts: Vec<(Cohort, usize)>,
    /// (brand key, display name) pairs.
    pub brands: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(share: f64) -> RankedRow {
        RankedRow {
            row: AggregatedRow {
                year: None,
                event: None,
                brand: "特步".into(),
                name_en: "Xtep".into(),
                brand_type: BrandType::Domestic,
                share,
                members: 2,
            },
            rank: 1,
        }
    }

    #[test]
    fn leaderboard_entry_rounds_percent() {
        let e = LeaderboardEntry::from(ranked(0.12345));
        assert_eq!(e.share_pct, 12.3);
        assert_eq!(e.category, "国内");
        assert_eq!(e.share, 0.12345);
    }

    #[test]
    fn focus_panel_skips_missing_ranks() {
        let point = |year: i32, rank: Option<u32>| RankPoint {
            year,
            event: None,
            rank,
            share: rank.map(|_| 0.1),
        };
        let panel = FocusPanel {
            brand: "乔丹".into(),
            shares: vec![],
            ranks: vec![
                point(2021, None),
                point(2022, Some(3)),
                point(2024, Some(5)),
                point(2025, None),
            ],
        };
        assert_eq!(panel.start_rank(), Some(3));
        assert_eq!(panel.end_rank(), Some(5));
        assert_eq!(panel.start_share(), None);
    }
}
