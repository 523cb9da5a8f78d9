use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Slack allowed when checking that a slice of shares does not exceed 1.
pub const SHARE_TOLERANCE: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Closed enumerations
// ---------------------------------------------------------------------------

/// Runner population a record was measured on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Cohort {
    /// Finishers with a net time under three hours.
    #[serde(rename = "破3选手", alias = "elite")]
    Elite,
    /// Every finisher.
    #[default]
    #[serde(rename = "全局跑者", alias = "general")]
    General,
}

impl Cohort {
    pub fn all() -> &'static [Cohort] {
        &[Cohort::General, Cohort::Elite]
    }

    /// The token used for this cohort in the source data.
    pub fn token(self) -> &'static str {
        match self {
            Cohort::Elite => "破3选手",
            Cohort::General => "全局跑者",
        }
    }
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cohort::Elite => write!(f, "elite"),
            Cohort::General => write!(f, "general"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown cohort: {0} (expected general or elite)")]
pub struct UnknownCohort(pub String);

impl FromStr for Cohort {
    type Err = UnknownCohort;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "elite" | "sub3" | "破3选手" => Ok(Cohort::Elite),
            "general" | "all" | "全局跑者" => Ok(Cohort::General),
            _ => Err(UnknownCohort(s.to_string())),
        }
    }
}

/// Where a brand comes from. Tokens other than `domestic` and
/// `international` classify as [`BrandType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum BrandType {
    Domestic,
    International,
    Other,
}

impl From<String> for BrandType {
    fn from(token: String) -> Self {
        match token.as_str() {
            "domestic" => BrandType::Domestic,
            "international" => BrandType::International,
            _ => BrandType::Other,
        }
    }
}

impl BrandType {
    /// Localized category label shown next to each brand.
    pub fn label_local(self) -> &'static str {
        match self {
            BrandType::Domestic => "国内",
            BrandType::International => "国际",
            BrandType::Other => "其他",
        }
    }
}

impl fmt::Display for BrandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrandType::Domestic => write!(f, "domestic"),
            BrandType::International => write!(f, "international"),
            BrandType::Other => write!(f, "other"),
        }
    }
}

// ---------------------------------------------------------------------------
// Input shapes
// ---------------------------------------------------------------------------

/// One row of the input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub event: String,
    pub year: i32,
    pub cohort: Cohort,
    pub brand: String,
    pub brand_type: BrandType,
    pub share: f64,
}

/// Display metadata for a brand key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrandMeta {
    #[serde(default)]
    pub name_en: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDataset {
    records: Vec<Record>,
    brands: BTreeMap<String, BrandMeta>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read dataset {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed dataset: {0}")]
    Json(#[from] serde_json::Error),
    #[error("record {index} ({brand}): share {share} is outside [0, 1]")]
    ShareOutOfRange {
        index: usize,
        brand: String,
        share: f64,
    },
    #[error("shares for {event} {year} ({cohort}) sum to {total:.4}, above 1")]
    SliceOverflow {
        event: String,
        year: i32,
        cohort: Cohort,
        total: f64,
    },
}

// ---------------------------------------------------------------------------
// Normalized relation
// ---------------------------------------------------------------------------

/// A record with its display name and category label resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub event: String,
    pub year: i32,
    pub cohort: Cohort,
    pub brand: String,
    pub brand_type: BrandType,
    pub share: f64,
    pub name_en: String,
    pub category: &'static str,
}

/// The immutable, normalized base relation.
#[derive(Debug, Clone)]
pub struct Dataset {
    rows: Vec<Row>,
    brands: BTreeMap<String, BrandMeta>,
}

impl Dataset {
    /// Parse and validate the JSON input. Any malformed record fails the
    /// whole load.
    pub fn from_json(bytes: &[u8]) -> Result<Self, LoadError> {
        let raw: RawDataset = serde_json::from_slice(bytes)?;
        Self::from_parts(raw.records, raw.brands)
    }

    pub fn from_parts(
        records: Vec<Record>,
        brands: BTreeMap<String, BrandMeta>,
    ) -> Result<Self, LoadError> {
        validate(&records)?;

        let rows = records
            .into_iter()
            .map(|r| {
                let name_en = resolve_name(&brands, &r.brand).to_string();
                Row {
                    category: r.brand_type.label_local(),
                    name_en,
                    event: r.event,
                    year: r.year,
                    cohort: r.cohort,
                    brand: r.brand,
                    brand_type: r.brand_type,
                    share: r.share,
                }
            })
            .collect();

        Ok(Self { rows, brands })
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct event names, sorted.
    pub fn events(&self) -> BTreeSet<&str> {
        self.rows.iter().map(|r| r.event.as_str()).collect()
    }

    pub fn years(&self) -> BTreeSet<i32> {
        self.rows.iter().map(|r| r.year).collect()
    }

    pub fn brand_keys(&self) -> BTreeSet<&str> {
        self.rows.iter().map(|r| r.brand.as_str()).collect()
    }

    /// English display name for `brand`, or the key itself when the
    /// metadata table has no name for it.
    pub fn display_name<'a>(&'a self, brand: &'a str) -> &'a str {
        resolve_name(&self.brands, brand)
    }
}

fn resolve_name<'a>(brands: &'a BTreeMap<String, BrandMeta>, brand: &'a str) -> &'a str {
    brands
        .get(brand)
        .and_then(|m| m.name_en.as_deref())
        .unwrap_or(brand)
}

fn validate(records: &[Record]) -> Result<(), LoadError> {
    let mut totals: BTreeMap<(&str, i32, Cohort), f64> = BTreeMap::new();

    for (index, r) in records.iter().enumerate() {
        if !r.share.is_finite() || !(0.0..=1.0).contains(&r.share) {
            return Err(LoadError::ShareOutOfRange {
                index,
                brand: r.brand.clone(),
                share: r.share,
            });
        }
        *totals.entry((r.event.as_str(), r.year, r.cohort)).or_insert(0.0) += r.share;
    }

    for ((event, year, cohort), total) in totals {
        if total > 1.0 + SHARE_TOLERANCE {
            return Err(LoadError::SliceOverflow {
                event: event.to_string(),
                year,
                cohort,
                total,
            });
        }
    }

    Ok(())
}
