use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::aggregate::AggregatedRow;
use crate::dataset::{BrandType, SHARE_TOLERANCE};

/// Bucket a brand's share is summed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryGroup {
    DomesticTotal,
    InternationalTotal,
    Other,
}

impl CategoryGroup {
    pub fn label_local(self) -> &'static str {
        match self {
            CategoryGroup::DomesticTotal => "国内品牌总和",
            CategoryGroup::InternationalTotal => "国际品牌总和",
            CategoryGroup::Other => "其他",
        }
    }
}

impl From<BrandType> for CategoryGroup {
    fn from(t: BrandType) -> Self {
        match t {
            BrandType::Domestic => CategoryGroup::DomesticTotal,
            BrandType::International => CategoryGroup::InternationalTotal,
            BrandType::Other => CategoryGroup::Other,
        }
    }
}

impl fmt::Display for CategoryGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryGroup::DomesticTotal => write!(f, "domestic total"),
            CategoryGroup::InternationalTotal => write!(f, "international total"),
            CategoryGroup::Other => write!(f, "other"),
        }
    }
}

/// Summed share of one category in one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub year: i32,
    pub group: CategoryGroup,
    /// Localized name of `group`.
    pub label: &'static str,
    /// Sum of the brand shares in this category. Event-scoped input is
    /// summed per event and then averaged over the events present.
    pub share: f64,
    /// `share` divided by the year total, for a 100%-stacked view.
    pub normalized: f64,
}

/// Category totals per year, ordered by (year, group).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Composition {
    pub rows: Vec<CategoryShare>,
}

/// Sum per-brand rows into one row per (year, category). Rows without a
/// year are ignored.
///
/// Each event scope of a year is summed on its own first, so a year covering
/// two events still totals about 1 rather than 2. A scope with no brand in
/// a category contributes zero to that category's mean.
pub fn combine(rows: &[AggregatedRow]) -> Composition {
    let mut scopes: BTreeMap<i32, BTreeSet<Option<&str>>> = BTreeMap::new();
    let mut sums: BTreeMap<(i32, CategoryGroup), f64> = BTreeMap::new();
    for row in rows {
        if let Some(year) = row.year {
            scopes.entry(year).or_default().insert(row.event.as_deref());
            *sums.entry((year, row.brand_type.into())).or_insert(0.0) += row.share;
        }
    }

    let mut totals: BTreeMap<i32, f64> = BTreeMap::new();
    for ((year, _), sum) in sums.iter_mut() {
        let n = scopes.get(year).map_or(1, BTreeSet::len);
        *sum /= n as f64;
        *totals.entry(*year).or_insert(0.0) += *sum;
    }
    for (year, total) in &totals {
        if *total > 1.0 + SHARE_TOLERANCE {
            warn!(year, total, "category shares exceed 100%");
        }
    }

    let rows = sums
        .into_iter()
        .map(|((year, group), share)| {
            let total = totals.get(&year).copied().unwrap_or(0.0);
            CategoryShare {
                year,
                group,
                label: group.label_local(),
                share,
                normalized: if total > 0.0 { share / total } else { 0.0 },
            }
        })
        .collect();

    Composition { rows }
}

impl Composition {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn years(&self) -> BTreeSet<i32> {
        self.rows.iter().map(|r| r.year).collect()
    }

    /// Share of `group` in `year`, `0.0` when absent.
    pub fn share_in(&self, year: i32, group: CategoryGroup) -> f64 {
        self.rows
            .iter()
            .find(|r| r.year == year && r.group == group)
            .map_or(0.0, |r| r.share)
    }

    pub fn domestic_share(&self, year: i32) -> f64 {
        self.share_in(year, CategoryGroup::DomesticTotal)
    }
}
