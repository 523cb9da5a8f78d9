use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::aggregate::AggregatedRow;
use crate::filter::View;

/// How many top brands seed the default trend selection.
pub const DEFAULT_TOP_BRANDS: usize = 10;
/// Cap on the default trend selection.
pub const DEFAULT_SELECTION_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increase,
    Decrease,
}

impl Direction {
    /// Anything not strictly positive counts as a decrease, including an
    /// exact zero.
    pub fn from_delta(delta: f64) -> Self {
        if delta > 0.0 {
            Direction::Increase
        } else {
            Direction::Decrease
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Increase => write!(f, "increase"),
            Direction::Decrease => write!(f, "decrease"),
        }
    }
}

/// First-vs-last comparison for one brand's series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub brand: String,
    pub start_year: i32,
    pub end_year: i32,
    pub start: f64,
    pub end: f64,
    pub delta: f64,
    /// Percent change relative to `start`; `0.0` when `start` is zero.
    pub pct_change: f64,
    pub direction: Direction,
}

impl TrendSummary {
    fn from_points(brand: &str, first: &AggregatedRow, last: &AggregatedRow) -> Self {
        let (start, end) = (first.share, last.share);
        let delta = end - start;
        let pct_change = if start > 0.0 { delta / start * 100.0 } else { 0.0 };
        Self {
            brand: brand.to_string(),
            start_year: first.year.unwrap_or_default(),
            end_year: last.year.unwrap_or_default(),
            start,
            end,
            delta,
            pct_change,
            direction: Direction::from_delta(delta),
        }
    }

    /// One markdown bullet, e.g.
    /// `- **特步**: 10.0% → 15.0% (+50.0%), overall increase.`
    pub fn line(&self) -> String {
        let sign = if self.delta > 0.0 { "+" } else { "" };
        format!(
            "- **{}**: {:.1}% → {:.1}% ({}{:.1}%), overall {}.",
            self.brand,
            self.start * 100.0,
            self.end * 100.0,
            sign,
            self.pct_change,
            self.direction
        )
    }
}

/// Rows of `rows` that belong to a selected brand and carry a year.
pub fn trend_series(rows: &[AggregatedRow], brands: &[String]) -> Vec<AggregatedRow> {
    let wanted: HashSet<&str> = brands.iter().map(String::as_str).collect();
    rows.iter()
        .filter(|r| r.year.is_some() && wanted.contains(r.brand.as_str()))
        .cloned()
        .collect()
}

/// Summarize each selected brand, in selection order. Brands with fewer
/// than two points are skipped.
pub fn summarize(series: &[AggregatedRow], brands: &[String]) -> Vec<TrendSummary> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for brand in brands {
        if !seen.insert(brand.as_str()) {
            continue;
        }
        let mut points: Vec<&AggregatedRow> = series
            .iter()
            .filter(|r| r.brand == *brand && r.year.is_some())
            .collect();
        if points.len() < 2 {
            continue;
        }
        points.sort_by(|a, b| a.year.cmp(&b.year).then_with(|| a.event.cmp(&b.event)));
        out.push(TrendSummary::from_points(brand, points[0], points[points.len() - 1]));
    }

    out
}

/// Default brands to chart: `focus` first when it has data, then the
/// highest mean-share brands over the whole view.
pub fn default_selection(view: &View<'_>, focus: &str) -> Vec<String> {
    let mut totals: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for row in view.rows() {
        let entry = totals.entry(row.brand.as_str()).or_insert((0.0, 0));
        entry.0 += row.share;
        entry.1 += 1;
    }

    let mut means: Vec<(&str, f64)> = totals
        .into_iter()
        .map(|(brand, (sum, n))| (brand, sum / n as f64))
        .collect();
    means.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut selection = Vec::with_capacity(DEFAULT_SELECTION_SIZE);
    if view.contains_brand(focus) {
        selection.push(focus.to_string());
    }
    selection.extend(
        means
            .into_iter()
            .take(DEFAULT_TOP_BRANDS)
            .map(|(b, _)| b)
            .filter(|b| *b != focus)
            .map(str::to_string),
    );
    selection.truncate(DEFAULT_SELECTION_SIZE);
    selection
}
