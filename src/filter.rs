use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::{Cohort, Dataset, Row};

/// Earliest year a query may ask for.
pub const MIN_YEAR: i32 = 2021;
/// Latest year a query may ask for.
pub const MAX_YEAR: i32 = 2025;

/// Inclusive year bounds, always within [`MIN_YEAR`]..=[`MAX_YEAR`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    min: i32,
    max: i32,
}

impl YearRange {
    /// Clamp both ends into the supported window. Returns `None` when the
    /// clamped range is inverted.
    pub fn clamped(min: i32, max: i32) -> Option<Self> {
        let min = min.clamp(MIN_YEAR, MAX_YEAR);
        let max = max.clamp(MIN_YEAR, MAX_YEAR);
        (min <= max).then_some(Self { min, max })
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.min..=self.max).contains(&year)
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            min: MIN_YEAR,
            max: MAX_YEAR,
        }
    }
}

/// Row predicate: event membership, year range and cohort equality.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub events: BTreeSet<String>,
    pub years: YearRange,
    pub cohort: Cohort,
}

impl Filter {
    pub fn new(events: BTreeSet<String>, years: YearRange, cohort: Cohort) -> Self {
        Self {
            events,
            years,
            cohort,
        }
    }

    /// A filter selecting every event present in `dataset`.
    pub fn all_events(dataset: &Dataset, years: YearRange, cohort: Cohort) -> Self {
        let events = dataset.events().into_iter().map(str::to_string).collect();
        Self::new(events, years, cohort)
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.events.contains(&row.event)
            && self.years.contains(row.year)
            && row.cohort == self.cohort
    }

    pub fn apply<'a>(&self, dataset: &'a Dataset) -> View<'a> {
        let rows: Vec<&Row> = dataset.rows().iter().filter(|r| self.matches(r)).collect();
        debug!(
            matched = rows.len(),
            total = dataset.len(),
            cohort = %self.cohort,
            "filter applied"
        );
        View { rows }
    }
}

/// Borrowed subset of the base relation.
#[derive(Debug, Clone, Default)]
pub struct View<'a> {
    rows: Vec<&'a Row>,
}

impl<'a> View<'a> {
    pub fn rows(&self) -> &[&'a Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Narrow further to a single year.
    pub fn in_year(&self, year: i32) -> View<'a> {
        View {
            rows: self.rows.iter().copied().filter(|r| r.year == year).collect(),
        }
    }

    pub fn brands(&self) -> BTreeSet<&'a str> {
        self.rows.iter().map(|r| r.brand.as_str()).collect()
    }

    pub fn contains_brand(&self, brand: &str) -> bool {
        self.rows.iter().any(|r| r.brand == brand)
    }
}
