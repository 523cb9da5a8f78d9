use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::dataset::BrandType;
use crate::filter::View;

/// Which dimensions survive aggregation. `brand` is always kept.
///
/// When events are not aggregated, `event` is forced into the key so the
/// resulting rows stay event-scoped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grouping {
    by_year: bool,
    by_event: bool,
}

impl Grouping {
    pub fn new(by_year: bool, aggregate_events: bool) -> Self {
        Self {
            by_year,
            by_event: !aggregate_events,
        }
    }

    /// Grouping for a leaderboard over a single year.
    pub fn leaderboard(aggregate_events: bool) -> Self {
        Self::new(false, aggregate_events)
    }

    /// Grouping for multi-year series.
    pub fn trend(aggregate_events: bool) -> Self {
        Self::new(true, aggregate_events)
    }
}

/// Mean share of one brand over a group of filtered rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    pub brand: String,
    pub name_en: String,
    pub brand_type: BrandType,
    pub share: f64,
    /// Number of input rows averaged into `share`.
    pub members: usize,
}

type GroupKey = (Option<i32>, Option<String>, String, BrandType);

struct Acc<'a> {
    name_en: &'a str,
    shares: Vec<f64>,
}

/// Collapse `view` along `grouping`, taking the arithmetic mean of share.
///
/// Output is ordered by (year, event, brand) regardless of input order,
/// and member shares are summed in sorted order so the mean is
/// bit-for-bit reproducible.
pub fn aggregate(view: &View<'_>, grouping: Grouping) -> Vec<AggregatedRow> {
    let mut groups: BTreeMap<GroupKey, Acc<'_>> = BTreeMap::new();

    for row in view.rows() {
        let key = (
            grouping.by_year.then_some(row.year),
            grouping.by_event.then(|| row.event.clone()),
            row.brand.clone(),
            row.brand_type,
        );
        groups
            .entry(key)
            .or_insert_with(|| Acc {
                name_en: &row.name_en,
                shares: Vec::new(),
            })
            .shares
            .push(row.share);
    }

    debug!(groups = groups.len(), rows = view.len(), "aggregated");

    groups
        .into_iter()
        .map(|((year, event, brand, brand_type), mut acc)| {
            acc.shares.sort_by(f64::total_cmp);
            let members = acc.shares.len();
            let sum: f64 = acc.shares.iter().sum();
            AggregatedRow {
                year,
                event,
                brand,
                name_en: acc.name_en.to_string(),
                brand_type,
                share: sum / members as f64,
                members,
            }
        })
        .collect()
}
