use crate::aggregate::{aggregate, AggregatedRow, Grouping};
use crate::cache::Snapshot;
use crate::category::combine;
use crate::config::QueryParams;
use crate::dataset::{Cohort, Dataset};
use crate::filter::View;
use crate::rank::{leaderboard, rank_trajectory};
use crate::report::{
    Catalog, CompositionReport, Dashboard, FocusPanel, Leaderboard, LeaderboardEntry, QuerySummary,
    Trends,
};
use crate::trend::{default_selection, summarize, trend_series};

/// Runs every dashboard component over one immutable dataset.
///
/// Each method filters the base relation afresh; nothing computed for one
/// query is kept for the next.
pub struct Engine<'a> {
    dataset: &'a Dataset,
}

impl<'a> Engine<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self { dataset }
    }

    pub fn from_snapshot(snapshot: &'a Snapshot) -> Self {
        Self::new(snapshot.dataset())
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn view(&self, params: &QueryParams) -> View<'a> {
        params.filter(self.dataset).apply(self.dataset)
    }

    fn yearly(&self, view: &View<'a>, params: &QueryParams) -> Vec<AggregatedRow> {
        aggregate(view, Grouping::trend(params.aggregate_events))
    }

    pub fn query_summary(&self, params: &QueryParams) -> QuerySummary {
        let filter = params.filter(self.dataset);
        QuerySummary {
            rows_matched: filter.apply(self.dataset).len(),
            events: filter.events.into_iter().collect(),
            min_year: params.years.min(),
            max_year: params.years.max(),
            cohort: params.cohort,
            aggregate_events: params.aggregate_events,
        }
    }

    /// Top `params.top_n` brands in the last year of the range.
    pub fn leaderboard(&self, params: &QueryParams) -> Leaderboard {
        let year = params.years.max();
        let latest = self.view(params).in_year(year);
        let rows = aggregate(&latest, Grouping::leaderboard(params.aggregate_events));
        Leaderboard {
            year,
            entries: leaderboard(rows, params.top_n)
                .into_iter()
                .map(LeaderboardEntry::from)
                .collect(),
        }
    }

    pub fn trends(&self, params: &QueryParams) -> Trends {
        let view = self.view(params);
        let selected_brands = match &params.selected_brands {
            Some(brands) => brands.clone(),
            None => default_selection(&view, &params.focus_brand),
        };
        let series = trend_series(&self.yearly(&view, params), &selected_brands);
        let summaries = summarize(&series, &selected_brands);
        Trends {
            selected_brands,
            series,
            summaries,
        }
    }

    /// Share series and per-year rank of `params.focus_brand`.
    pub fn focus(&self, params: &QueryParams) -> FocusPanel {
        let view = self.view(params);
        let yearly = self.yearly(&view, params);
        let brand = params.focus_brand.clone();
        FocusPanel {
            shares: yearly.iter().filter(|r| r.brand == brand).cloned().collect(),
            ranks: rank_trajectory(&yearly, &brand),
            brand,
        }
    }

    pub fn composition(&self, params: &QueryParams) -> CompositionReport {
        let view = self.view(params);
        let composition = combine(&self.yearly(&view, params));
        let latest_year = params.years.max();
        let latest_domestic = composition.domestic_share(latest_year);
        CompositionReport {
            series: composition.rows,
            latest_year,
            latest_domestic,
            latest_international: 1.0 - latest_domestic,
        }
    }

    pub fn run(&self, params: &QueryParams) -> Dashboard {
        Dashboard {
            query: self.query_summary(params),
            leaderboard: self.leaderboard(params),
            trends: self.trends(params),
            focus: self.focus(params),
            composition: self.composition(params),
        }
    }

    pub fn catalog(&self, fingerprint: String) -> Catalog {
        let ds = self.dataset;
        Catalog {
            rows: ds.len(),
            fingerprint,
            events: ds.events().into_iter().map(str::to_string).collect(),
            years: ds.years().into_iter().collect(),
            cohorts: Cohort::all()
                .iter()
                .map(|c| (*c, ds.rows().iter().filter(|r| r.cohort == *c).count()))
                .collect(),
            brands: ds
                .brand_keys()
                .into_iter()
                .map(|b| (b.to_string(), ds.display_name(b).to_string()))
                .collect(),
        }
    }
}
