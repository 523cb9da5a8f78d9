use serde::Serialize;

use crate::report::{
    Catalog, CompositionReport, Dashboard, FocusPanel, Leaderboard, QuerySummary, Trends,
};

/// Output format for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Text,
    Json,
}

/// Format any report section as JSON.
pub fn format_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).expect("report should be serializable")
}

fn pct(share: f64) -> String {
    format!("{:.1}%", share * 100.0)
}

fn display_brand(brand: &str, name_en: &str) -> String {
    if brand == name_en {
        brand.to_string()
    } else {
        format!("{brand} ({name_en})")
    }
}

fn scope(event: Option<&str>) -> String {
    event.map(|e| format!(" [{e}]")).unwrap_or_default()
}

pub fn query_text(q: &QuerySummary) -> String {
    format!(
        "Cohort: {} ({}) | Years: {}-{} | Events: {} | {} | Rows: {}\n",
        q.cohort,
        q.cohort.token(),
        q.min_year,
        q.max_year,
        if q.events.is_empty() { "(none)".to_string() } else { q.events.join(", ") },
        if q.aggregate_events { "averaged across events" } else { "per event" },
        q.rows_matched
    )
}

pub fn leaderboard_text(lb: &Leaderboard) -> String {
    let mut out = format!("Leaderboard {} (top {}):\n", lb.year, lb.entries.len());
    if lb.entries.is_empty() {
        out.push_str("  (no data)\n");
    }
    for e in &lb.entries {
        out.push_str(&format!(
            "  {:>3}  {:<28} {:<4} {:>5.1}%{}\n",
            e.rank,
            display_brand(&e.brand, &e.name_en),
            e.category,
            e.share_pct,
            scope(e.event.as_deref())
        ));
    }
    out
}

pub fn trends_text(t: &Trends) -> String {
    let mut out = format!("Trends for: {}\n", t.selected_brands.join(", "));
    for row in &t.series {
        out.push_str(&format!(
            "  {}  {:<20} {:>6}{}\n",
            row.year.unwrap_or_default(),
            row.brand,
            pct(row.share),
            scope(row.event.as_deref())
        ));
    }
    if !t.summaries.is_empty() {
        out.push_str("\nSummary:\n");
        out.push_str(&t.summary_text());
        out.push('\n');
    }
    out
}

pub fn focus_text(f: &FocusPanel) -> String {
    let mut out = format!("Focus: {}\n", f.brand);
    for p in &f.ranks {
        let standing = match (p.rank, p.share) {
            (Some(rank), Some(share)) => format!("#{rank:<3} {}", pct(share)),
            _ => "no data".to_string(),
        };
        out.push_str(&format!("  {}  {}{}\n", p.year, standing, scope(p.event.as_deref())));
    }
    if let (Some(start), Some(end)) = (f.start_share(), f.end_share()) {
        out.push_str(&format!("Share: {} → {}\n", pct(start), pct(end)));
    }
    if let (Some(start), Some(end)) = (f.start_rank(), f.end_rank()) {
        out.push_str(&format!("Rank: #{start} → #{end} (lower is better)\n"));
    }
    out
}

pub fn composition_text(c: &CompositionReport) -> String {
    let mut out = String::from("Domestic vs international:\n");
    for row in &c.series {
        out.push_str(&format!(
            "  {}  {:<8} {:<20} {:>6} ({} of total)\n",
            row.year,
            row.label,
            row.group.to_string(),
            pct(row.share),
            pct(row.normalized)
        ));
    }
    out.push_str(&format!(
        "{}: domestic {}, international {}\n",
        c.latest_year,
        pct(c.latest_domestic),
        pct(c.latest_international)
    ));
    out
}

pub fn catalog_text(c: &Catalog) -> String {
    let mut out = format!("Rows: {} | Fingerprint: {}\n", c.rows, c.fingerprint);
    out.push_str(&format!("Events: {}\n", c.events.join(", ")));
    out.push_str(&format!(
        "Years: {}\n",
        c.years.iter().map(|y| y.to_string()).collect::<Vec<_>>().join(", ")
    ));
    let cohorts: Vec<String> = c
        .cohorts
        .iter()
        .map(|(cohort, rows)| format!("{} ({cohort}) {rows}", cohort.token()))
        .collect();
    out.push_str(&format!("Cohorts: {}\n", cohorts.join(", ")));
    out.push_str(&format!("Brands ({}):\n", c.brands.len()));
    for (key, name) in &c.brands {
        out.push_str(&format!("  {}\n", display_brand(key, name)));
    }
    out
}

/// Format a whole dashboard as plain text (no colors).
pub fn format_text(d: &Dashboard) -> String {
    [
        query_text(&d.query),
        leaderboard_text(&d.leaderboard),
        trends_text(&d.trends),
        focus_text(&d.focus),
        composition_text(&d.composition),
    ]
    .join("\n")
}

#[cfg(feature = "cli")]
mod pretty {
    use colored::Colorize;

    use super::{display_brand, pct, scope};
    use crate::colors::CategoryTheme;
    use crate::report::{CompositionReport, Dashboard, FocusPanel, Leaderboard, Trends};
    use crate::trend::Direction;

    pub fn leaderboard_pretty(lb: &Leaderboard, theme: &dyn CategoryTheme) -> String {
        let mut out = format!("{} {}\n", "Leaderboard".bold(), lb.year);
        if lb.entries.is_empty() {
            out.push_str(&format!("  {}\n", "no data".dimmed()));
        }
        let top = lb.entries.first().map(|e| e.share).unwrap_or(0.0);
        for e in &lb.entries {
            let bar_len = if top > 0.0 { (e.share / top * 20.0) as usize } else { 0 };
            let bar = "█".repeat(bar_len);
            let color = theme.brand_color(e.brand_type);
            out.push_str(&format!(
                "  {:>3}  {:<28} {} {:>5.1}%{}\n",
                e.rank.to_string().bold(),
                display_brand(&e.brand, &e.name_en),
                bar.color(color),
                e.share_pct,
                scope(e.event.as_deref()).dimmed()
            ));
        }
        out
    }

    pub fn trends_pretty(t: &Trends) -> String {
        let mut out = format!("{} {}\n", "Trends:".bold(), t.selected_brands.join(", "));
        for row in &t.series {
            out.push_str(&format!(
                "  {}  {:<20} {:>6}{}\n",
                row.year.unwrap_or_default().to_string().dimmed(),
                row.brand,
                pct(row.share),
                scope(row.event.as_deref()).dimmed()
            ));
        }
        if !t.summaries.is_empty() {
            out.push_str(&format!("\n{}\n", "Summary:".bold()));
            for s in &t.summaries {
                let line = s.line();
                let styled = match s.direction {
                    Direction::Increase => line.green(),
                    Direction::Decrease => line.red(),
                };
                out.push_str(&format!("{styled}\n"));
            }
        }
        out
    }

    pub fn focus_pretty(f: &FocusPanel) -> String {
        let mut out = format!("{} {}\n", "Focus:".bold(), f.brand.bold());
        for p in &f.ranks {
            let standing = match (p.rank, p.share) {
                (Some(rank), Some(share)) => format!("#{rank:<3} {}", pct(share)).normal(),
                _ => "no data".dimmed(),
            };
            out.push_str(&format!("  {}  {}{}\n", p.year, standing, scope(p.event.as_deref())));
        }
        if let (Some(start), Some(end)) = (f.start_rank(), f.end_rank()) {
            let arrow = format!("#{start} → #{end}");
            let arrow = if end > start { arrow.red() } else { arrow.green() };
            out.push_str(&format!("{} {}\n", "Rank:".dimmed(), arrow));
        }
        out
    }

    pub fn composition_pretty(c: &CompositionReport, theme: &dyn CategoryTheme) -> String {
        let mut out = format!("{}\n", "Domestic vs international:".bold());
        for row in &c.series {
            let bar = "█".repeat((row.normalized * 30.0) as usize);
            out.push_str(&format!(
                "  {}  {:<8} {} {}\n",
                row.year,
                row.label,
                bar.color(theme.terminal_color(row.group)),
                pct(row.share)
            ));
        }
        out.push_str(&format!(
            "{} domestic {}, international {}\n",
            format!("{}:", c.latest_year).bold(),
            pct(c.latest_domestic).bold(),
            pct(c.latest_international)
        ));
        out
    }

    /// Format a whole dashboard with terminal colors.
    pub fn format_pretty(d: &Dashboard, theme: &dyn CategoryTheme) -> String {
        [
            super::query_text(&d.query).dimmed().to_string(),
            leaderboard_pretty(&d.leaderboard, theme),
            trends_pretty(&d.trends),
            focus_pretty(&d.focus),
            composition_pretty(&d.composition, theme),
        ]
        .join("\n")
    }
}

#[cfg(feature = "cli")]
pub use pretty::{
    composition_pretty, focus_pretty, format_pretty, leaderboard_pretty, trends_pretty,
};
