use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use shoeboard::aggregate::{aggregate, Grouping};
use shoeboard::cache::DatasetLoader;
use shoeboard::category::CategoryGroup;
use shoeboard::config::QueryParams;
use shoeboard::dataset::Cohort;
use shoeboard::filter::YearRange;
use shoeboard::output::format_json;
use shoeboard::pipeline::Engine;
use shoeboard::trend::Direction;

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/marathon_shoe_data.json")
}

fn loader() -> DatasetLoader {
    DatasetLoader::from_path(fixture())
}

fn years(min: i32, max: i32) -> QueryParams {
    QueryParams {
        years: YearRange::clamped(min, max).unwrap(),
        ..QueryParams::default()
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ── Leaderboard ────────────────────────────────────────────────────────

#[test]
fn leaderboard_for_latest_year() {
    let snapshot = loader().load().unwrap();
    let lb = Engine::from_snapshot(&snapshot).leaderboard(&QueryParams::default());

    assert_eq!(lb.year, 2025);
    let order: Vec<(&str, u32)> = lb
        .entries
        .iter()
        .map(|e| (e.brand.as_str(), e.rank))
        .collect();
    assert_eq!(
        order,
        vec![
            ("特步", 1),
            ("安踏", 2),
            ("耐克", 3),
            ("李宁", 4),
            ("乔丹", 5),
            ("某跑鞋", 6),
        ]
    );
    assert_eq!(lb.entries[0].share_pct, 34.0);
    assert_eq!(lb.entries[0].name_en, "Xtep");
    assert_eq!(lb.entries[0].category, "国内");

    let unknown = &lb.entries[5];
    assert_eq!(unknown.name_en, "某跑鞋");
    assert_eq!(unknown.category, "其他");
}

#[test]
fn leaderboard_uses_competition_ranking() {
    let snapshot = loader().load().unwrap();
    let lb = Engine::from_snapshot(&snapshot).leaderboard(&years(2021, 2023));

    assert_eq!(lb.year, 2023);
    let order: Vec<(&str, u32)> = lb
        .entries
        .iter()
        .map(|e| (e.brand.as_str(), e.rank))
        .collect();
    assert_eq!(
        order,
        vec![
            ("特步", 1),
            ("耐克", 2),
            ("乔丹", 3),
            ("安踏", 4),
            ("亚瑟士", 5),
            ("李宁", 5),
            ("某跑鞋", 7),
        ]
    );
}

#[test]
fn leaderboard_respects_top_n() {
    let snapshot = loader().load().unwrap();
    let params = QueryParams {
        top_n: 3,
        ..QueryParams::default()
    };
    let lb = Engine::from_snapshot(&snapshot).leaderboard(&params);
    assert_eq!(lb.entries.len(), 3);
}

#[test]
fn per_event_leaderboard_is_event_scoped() {
    let snapshot = loader().load().unwrap();
    let params = QueryParams {
        aggregate_events: false,
        ..QueryParams::default()
    };
    let lb = Engine::from_snapshot(&snapshot).leaderboard(&params);

    assert_eq!(lb.entries.len(), 11);
    assert!(lb.entries.iter().all(|e| e.event.is_some()));
    assert_eq!(lb.entries[0].brand, "特步");
    assert_eq!(lb.entries[0].event.as_deref(), Some("厦门马拉松"));
    assert_eq!(lb.entries[0].share, 0.36);
}

// ── Aggregation ────────────────────────────────────────────────────────

#[test]
fn mean_across_events_is_arithmetic() {
    let snapshot = loader().load().unwrap();
    let engine = Engine::from_snapshot(&snapshot);
    let view = engine.view(&QueryParams::default()).in_year(2025);
    let rows = aggregate(&view, Grouping::leaderboard(true));

    let nike = rows.iter().find(|r| r.brand == "耐克").unwrap();
    assert!(close(nike.share, (0.10 + 0.12) / 2.0));
    assert_eq!(nike.members, 2);

    let boutique = rows.iter().find(|r| r.brand == "某跑鞋").unwrap();
    assert!(close(boutique.share, 0.04));
    assert_eq!(boutique.members, 1);
}

// ── Rank trajectory ────────────────────────────────────────────────────

#[test]
fn focus_brand_rank_trajectory() {
    let snapshot = loader().load().unwrap();
    let focus = Engine::from_snapshot(&snapshot).focus(&QueryParams::default());

    assert_eq!(focus.brand, "乔丹");
    let ranks: Vec<(i32, Option<u32>)> =
        focus.ranks.iter().map(|p| (p.year, p.rank)).collect();
    assert_eq!(ranks, vec![(2021, Some(2)), (2023, Some(3)), (2025, Some(5))]);
    assert_eq!(focus.start_rank(), Some(2));
    assert_eq!(focus.end_rank(), Some(5));
    assert!(close(focus.start_share().unwrap(), 0.18));
    assert!(close(focus.end_share().unwrap(), 0.07));
}

#[test]
fn per_event_rank_trajectory_matches_leaderboard() {
    let snapshot = loader().load().unwrap();
    let engine = Engine::from_snapshot(&snapshot);
    let params = QueryParams {
        aggregate_events: false,
        ..QueryParams::default()
    };

    let lb = engine.leaderboard(&params);
    let board: Vec<(Option<String>, u32)> = lb
        .entries
        .iter()
        .filter(|e| e.brand == "乔丹")
        .map(|e| (e.event.clone(), e.rank))
        .collect();
    assert_eq!(
        board,
        vec![
            (Some("厦门马拉松".to_string()), 9),
            (Some("上海马拉松".to_string()), 10),
        ]
    );

    let focus = engine.focus(&params);
    let trajectory: Vec<(Option<String>, u32)> = focus
        .ranks
        .iter()
        .filter(|p| p.year == 2025)
        .map(|p| (p.event.clone(), p.rank.unwrap()))
        .collect();
    assert_eq!(trajectory, board);
}

#[test]
fn absent_years_are_reported_as_missing() {
    let snapshot = loader().load().unwrap();
    let params = QueryParams {
        focus_brand: "阿迪达斯".into(),
        ..QueryParams::default()
    };
    let focus = Engine::from_snapshot(&snapshot).focus(&params);

    let ranks: Vec<(i32, Option<u32>)> =
        focus.ranks.iter().map(|p| (p.year, p.rank)).collect();
    assert_eq!(ranks, vec![(2021, Some(4)), (2023, None), (2025, None)]);
    assert_eq!(focus.ranks[1].share, None);
}

// ── Trends ─────────────────────────────────────────────────────────────

#[test]
fn default_selection_and_summaries() {
    let snapshot = loader().load().unwrap();
    let trends = Engine::from_snapshot(&snapshot).trends(&QueryParams::default());

    assert_eq!(
        trends.selected_brands,
        vec!["乔丹", "特步", "耐克", "阿迪达斯", "安踏", "李宁", "亚瑟士", "某跑鞋"]
    );

    // 阿迪达斯 and 亚瑟士 only have one year of data.
    let summarized: Vec<&str> = trends
        .summaries
        .iter()
        .map(|s| s.brand.as_str())
        .collect();
    assert_eq!(summarized, vec!["乔丹", "特步", "耐克", "安踏", "李宁", "某跑鞋"]);

    let qiaodan = &trends.summaries[0];
    assert!(close(qiaodan.delta, -0.11));
    assert!(close(qiaodan.pct_change, -0.11 / 0.18 * 100.0));
    assert_eq!(qiaodan.direction, Direction::Decrease);
    assert_eq!((qiaodan.start_year, qiaodan.end_year), (2021, 2025));
    assert!(trends
        .summary_text()
        .starts_with("- **乔丹**: 18.0% → 7.0% (-61.1%), overall decrease."));
}

#[test]
fn zero_start_share_in_elite_cohort() {
    let snapshot = loader().load().unwrap();
    let params = QueryParams {
        cohort: Cohort::Elite,
        selected_brands: Some(vec!["安踏".into(), "乔丹".into(), "特步".into()]),
        ..QueryParams::default()
    };
    let trends = Engine::from_snapshot(&snapshot).trends(&params);
    assert_eq!(trends.summaries.len(), 3);

    let anta = &trends.summaries[0];
    assert_eq!(anta.start, 0.0);
    assert!(close(anta.delta, 0.05));
    assert_eq!(anta.pct_change, 0.0);
    assert_eq!(anta.direction, Direction::Increase);

    let qiaodan = &trends.summaries[1];
    assert!(close(qiaodan.pct_change, -100.0));
    assert_eq!(qiaodan.direction, Direction::Decrease);

    let xtep = &trends.summaries[2];
    assert!(close(xtep.pct_change, 125.0));
    assert_eq!(xtep.direction, Direction::Increase);
}

#[test]
fn trend_series_only_has_selected_brands() {
    let snapshot = loader().load().unwrap();
    let params = QueryParams {
        selected_brands: Some(vec!["李宁".into()]),
        ..QueryParams::default()
    };
    let trends = Engine::from_snapshot(&snapshot).trends(&params);
    let years: Vec<Option<i32>> = trends.series.iter().map(|r| r.year).collect();
    assert_eq!(years, vec![Some(2021), Some(2023), Some(2025)]);
    assert!(trends.series.iter().all(|r| r.brand == "李宁"));
}

// ── Composition ────────────────────────────────────────────────────────

#[test]
fn composition_latest_domestic_share() {
    let snapshot = loader().load().unwrap();
    let comp = Engine::from_snapshot(&snapshot).composition(&QueryParams::default());

    assert_eq!(comp.latest_year, 2025);
    assert!(close(comp.latest_domestic, 0.64));
    assert!(close(comp.latest_international, 0.36));
}

#[test]
fn composition_sums_match_brand_rows() {
    let snapshot = loader().load().unwrap();
    let engine = Engine::from_snapshot(&snapshot);
    let params = QueryParams::default();
    let rows = aggregate(&engine.view(&params), Grouping::trend(true));
    let comp = engine.composition(&params);

    for year in [2021, 2023, 2025] {
        let brands: f64 = rows
            .iter()
            .filter(|r| r.year == Some(year))
            .map(|r| r.share)
            .sum();
        let in_year = comp.series.iter().filter(|r| r.year == year);
        let groups: f64 = in_year.clone().map(|r| r.share).sum();
        assert!((brands - groups).abs() < 1e-12, "year {year}");
        let normalized: f64 = in_year.map(|r| r.normalized).sum();
        assert!(close(normalized, 1.0), "year {year}");
    }
}

#[test]
fn per_event_composition_has_one_row_per_year_and_category() {
    let snapshot = loader().load().unwrap();
    let params = QueryParams {
        aggregate_events: false,
        ..QueryParams::default()
    };
    let comp = Engine::from_snapshot(&snapshot).composition(&params);

    let latest: Vec<(CategoryGroup, &str)> = comp
        .series
        .iter()
        .filter(|r| r.year == 2025)
        .map(|r| (r.group, r.label))
        .collect();
    assert_eq!(
        latest,
        vec![
            (CategoryGroup::DomesticTotal, "国内品牌总和"),
            (CategoryGroup::InternationalTotal, "国际品牌总和"),
            (CategoryGroup::Other, "其他"),
        ]
    );
    assert!(close(comp.latest_domestic, (0.68 + 0.60) / 2.0));

    // 某跑鞋 only ran in 厦门, so 上海 contributes zero to the mean.
    let other = comp
        .series
        .iter()
        .find(|r| r.year == 2025 && r.group == CategoryGroup::Other)
        .unwrap();
    assert!(close(other.share, 0.02));
}

#[test]
fn composition_for_year_without_data_is_zero() {
    let snapshot = loader().load().unwrap();
    let comp = Engine::from_snapshot(&snapshot).composition(&years(2021, 2024));
    assert_eq!(comp.latest_year, 2024);
    assert_eq!(comp.latest_domestic, 0.0);
}

// ── Whole-dashboard properties ─────────────────────────────────────────

#[test]
fn empty_event_set_yields_empty_outputs() {
    let snapshot = loader().load().unwrap();
    let params = QueryParams {
        events: Some(BTreeSet::new()),
        ..QueryParams::default()
    };
    let d = Engine::from_snapshot(&snapshot).run(&params);

    assert_eq!(d.query.rows_matched, 0);
    assert!(d.leaderboard.entries.is_empty());
    assert!(d.trends.selected_brands.is_empty());
    assert!(d.trends.series.is_empty());
    assert!(d.trends.summary_text().is_empty());
    assert!(d.focus.ranks.is_empty());
    assert!(d.composition.series.is_empty());
    assert_eq!(d.composition.latest_domestic, 0.0);
}

#[test]
fn repeated_queries_are_identical() {
    let loader = loader();
    let params = QueryParams::default();
    let first = format_json(&Engine::from_snapshot(&loader.load().unwrap()).run(&params));
    let second = format_json(&Engine::from_snapshot(&loader.load().unwrap()).run(&params));
    assert_eq!(first, second);
}

#[test]
fn shares_and_ranks_are_well_formed() {
    let snapshot = loader().load().unwrap();
    let engine = Engine::from_snapshot(&snapshot);

    for cohort in Cohort::all() {
        for aggregate_events in [true, false] {
            let params = QueryParams {
                cohort: *cohort,
                aggregate_events,
                ..QueryParams::default()
            };
            let d = engine.run(&params);
            for e in &d.leaderboard.entries {
                assert!((0.0..=1.0).contains(&e.share));
                assert!(e.rank >= 1);
                let greater = d
                    .leaderboard
                    .entries
                    .iter()
                    .filter(|o| o.share > e.share)
                    .count() as u32;
                assert_eq!(e.rank, greater + 1);
            }
            for r in &d.trends.series {
                assert!((0.0..=1.0).contains(&r.share));
            }
            for p in &d.focus.ranks {
                assert!(p.rank.map_or(true, |r| r >= 1));
            }
            for c in &d.composition.series {
                assert!((0.0..=1.0 + 1e-9).contains(&c.share));
            }
        }
    }
}

#[test]
fn only_selected_events_contribute() {
    let snapshot = loader().load().unwrap();
    let params = QueryParams {
        events: Some(BTreeSet::from(["上海马拉松".to_string()])),
        ..QueryParams::default()
    };
    let d = Engine::from_snapshot(&snapshot).run(&params);
    assert_eq!(d.query.events, vec!["上海马拉松"]);
    assert_eq!(d.leaderboard.entries[0].share, 0.32);
    assert!(d.leaderboard.entries.iter().all(|e| e.brand != "某跑鞋"));
}

// ── Convenience entry points ───────────────────────────────────────────

#[test]
fn analyze_file_runs_full_dashboard() {
    let d = shoeboard::analyze_file(&fixture(), &QueryParams::default()).unwrap();
    assert_eq!(d.query.events, vec!["上海马拉松", "厦门马拉松"]);
    assert_eq!(d.query.rows_matched, 32);
}

#[test]
fn analyze_reuses_loader_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");
    std::fs::copy(fixture(), &path).unwrap();

    let loader = DatasetLoader::from_path(&path);
    let first = shoeboard::analyze(&loader, &QueryParams::default()).unwrap();
    assert!(loader.is_loaded());

    // The file is gone, so a second query only works off the cached snapshot.
    std::fs::remove_file(&path).unwrap();
    let elite = QueryParams {
        cohort: Cohort::Elite,
        ..QueryParams::default()
    };
    let second = shoeboard::analyze(&loader, &elite).unwrap();
    assert_eq!(first.query.rows_matched, 32);
    assert_eq!(second.query.rows_matched, 8);
}

#[test]
fn analyze_file_missing_is_error() {
    let missing = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/absent.json");
    assert!(shoeboard::analyze_file(&missing, &QueryParams::default()).is_err());
}

#[test]
fn catalog_lists_dataset_contents() {
    let snapshot = loader().load().unwrap();
    let catalog = Engine::from_snapshot(&snapshot).catalog(snapshot.fingerprint_hex());
    assert_eq!(catalog.rows, 40);
    assert_eq!(catalog.years, vec![2021, 2023, 2025]);
    assert_eq!(catalog.cohorts, vec![(Cohort::General, 32), (Cohort::Elite, 8)]);
    assert_eq!(catalog.brands.len(), 8);
    assert!(catalog.brands.contains(&("耐克".to_string(), "Nike".to_string())));
}
