#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation result types for the detention statistics engine.
//!
//! These are the shapes handed to the presentation layer: per-category
//! pre/post breakdowns, current-vs-baseline pairs for "change" widgets,
//! ZIP-level maps and year-indexed trend series. All of them serialize
//! with `camelCase` keys.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Which date of a stay places it in a reporting window.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DateAxis {
    /// Entry date: admissions.
    Entry,
    /// Exit date: releases.
    Exit,
}

/// The metric families every aggregator understands.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum MetricKind {
    /// Stays whose entry date falls in the window.
    Admissions,
    /// Stays whose exit date falls in the window.
    Releases,
    /// Mean length of stay of releases in the window.
    AverageLengthOfStay,
    /// Median length of stay of releases in the window.
    MedianLengthOfStay,
    /// Mean number of people present per day of the window.
    AverageDailyPopulation,
}

impl MetricKind {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Admissions,
            Self::Releases,
            Self::AverageLengthOfStay,
            Self::MedianLengthOfStay,
            Self::AverageDailyPopulation,
        ]
    }
}

/// Mean or median, for length-of-stay metrics.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LosStatistic {
    /// Arithmetic mean.
    Mean,
    /// Middle value (mean of the two central values for even counts).
    Median,
}

/// Categorical dimensions a result can be sliced by.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BreakdownDimension {
    /// No slicing; every record lands in one group.
    Overall,
    Gender,
    /// Hispanic, otherwise the race column.
    RaceEthnicity,
    /// White / Youth of Color.
    RaceSimplified,
    /// Age at entry, bucketed by a named scheme.
    AgeBracket,
    /// Reason-for-detention group.
    OffenseCategory,
    /// Pre-dispo / post-dispo.
    DispoStatus,
    /// Successful / unsuccessful ATD exit. Only meaningful for ATD.
    SuccessFailure,
    /// Facility or ATD program.
    Facility,
    /// Law enforcement / court / school / other.
    ReferralSource,
    /// Exit destination column.
    ExitTo,
    /// Screened / not screened by the detention screening tool.
    ScreenedStatus,
    /// Offense category column as recorded.
    OffenseDetail,
    /// Felonies / misdemeanors / technicals / other.
    SimplifiedOffense,
    /// Referral source column as recorded.
    ReferralDetail,
    /// FTA / new offense / technical / other. Only meaningful for ATD.
    DisruptionType,
}

impl BreakdownDimension {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Overall,
            Self::Gender,
            Self::RaceEthnicity,
            Self::RaceSimplified,
            Self::AgeBracket,
            Self::OffenseCategory,
            Self::DispoStatus,
            Self::SuccessFailure,
            Self::Facility,
            Self::ReferralSource,
            Self::ExitTo,
            Self::ScreenedStatus,
            Self::OffenseDetail,
            Self::SimplifiedOffense,
            Self::ReferralDetail,
            Self::DisruptionType,
        ]
    }
}

/// One canonical category with its pre-/post-dispo contributions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBucket<T> {
    /// Category label (e.g. "New Offense").
    pub category: String,
    /// Contribution of pre-disposition stays.
    pub pre: T,
    /// Contribution of post-disposition stays.
    pub post: T,
}

impl<T: Copy + std::ops::Add<Output = T>> CategoryBucket<T> {
    /// Pre and post combined.
    #[must_use]
    pub fn combined(&self) -> T {
        self.pre + self.post
    }
}

/// One metric over one window with its prior-year baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult<T> {
    /// Metric over every qualifying record in the window.
    pub total: T,
    /// Same metric over the immediately preceding calendar year.
    pub previous_period_baseline: T,
    /// Per-category breakdown.
    pub by_category: Vec<CategoryBucket<T>>,
}

impl<T: Copy> AggregationResult<T> {
    /// `[current total, previous-period baseline]` for change widgets.
    #[must_use]
    pub fn change_pair(&self) -> [T; 2] {
        [self.total, self.previous_period_baseline]
    }

    /// Looks up a category bucket by label.
    #[must_use]
    pub fn category(&self, label: &str) -> Option<&CategoryBucket<T>> {
        self.by_category.iter().find(|b| b.category == label)
    }
}

/// A length-of-stay statistic over a set of samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LosSummary {
    /// Mean or median in days; `None` when there are no samples.
    pub value: Option<f64>,
    /// Number of samples.
    pub count: usize,
}

impl LosSummary {
    /// Summary of an empty sample set.
    pub const EMPTY: Self = Self {
        value: None,
        count: 0,
    };
}

/// Length-of-stay statistics for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LosCategoryBucket {
    pub category: String,
    pub pre: LosSummary,
    pub post: LosSummary,
    /// Pre and post samples pooled.
    pub all: LosSummary,
}

/// Mean or median length of stay over one window.
///
/// The current period is broken down by category and phase; the baseline
/// is a single figure over all qualifying releases of the prior year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LengthOfStayResult {
    pub statistic: LosStatistic,
    /// Statistic over all qualifying releases in the window.
    pub total: Option<f64>,
    /// Statistic over all qualifying releases in the preceding year.
    pub previous_period_baseline: Option<f64>,
    /// Number of samples behind the baseline.
    pub previous_period_count: usize,
    /// Pre/post/all across every category.
    pub overall: LosCategoryBucket,
    pub by_category: Vec<LosCategoryBucket>,
}

impl LengthOfStayResult {
    /// `[current total, previous-period baseline]` for change widgets.
    #[must_use]
    pub fn change_pair(&self) -> [Option<f64>; 2] {
        [self.total, self.previous_period_baseline]
    }
}

/// Current value, baseline and relative change, ready for a change widget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSummary {
    pub current: f64,
    pub previous: f64,
    /// Percentage change from `previous` to `current`; `None` when the
    /// baseline is zero.
    pub percent_change: Option<f64>,
}

impl ChangeSummary {
    /// Builds a summary from a current/baseline pair.
    #[must_use]
    pub fn new(current: f64, previous: f64) -> Self {
        Self {
            current,
            previous,
            percent_change: percent_change(current, previous),
        }
    }
}

/// Percentage change from `baseline` to `current`. `None` when the
/// baseline is zero.
#[must_use]
pub fn percent_change(current: f64, baseline: f64) -> Option<f64> {
    if baseline == 0.0 {
        None
    } else {
        Some(((current - baseline) / baseline) * 100.0)
    }
}

/// `part / whole * 100`, or `0.0` when `whole` is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percent_of(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64) * 100.0
    }
}

/// One metric grouped by home ZIP code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialResult<T> {
    pub metric: MetricKind,
    /// Values for ZIP codes inside the coverage set.
    pub by_zip: BTreeMap<String, T>,
    /// Pooled value for every ZIP code outside the coverage set.
    pub out_of_coverage: T,
    /// ZIP codes that were pooled into `out_of_coverage`.
    pub out_of_coverage_zips: Vec<String>,
}

/// Every metric family for one year and group of a trend series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearMetrics {
    pub admissions: u64,
    pub releases: u64,
    pub average_length_of_stay: Option<f64>,
    pub median_length_of_stay: Option<f64>,
    pub average_daily_population: f64,
}

/// `year -> group -> metrics`, consumed directly by trend charts.
pub type YearSeries = BTreeMap<i32, BTreeMap<String, YearMetrics>>;

/// Exit outcome tallies for one year and group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeCounts {
    pub total: u64,
    pub successful: u64,
    pub unsuccessful: u64,
    pub percent_successful: f64,
    pub percent_unsuccessful: f64,
}

impl OutcomeCounts {
    /// Builds tallies and percentages from raw counts.
    #[must_use]
    pub fn new(successful: u64, unsuccessful: u64) -> Self {
        let total = successful + unsuccessful;
        Self {
            total,
            successful,
            unsuccessful,
            percent_successful: percent_of(successful, total),
            percent_unsuccessful: percent_of(unsuccessful, total),
        }
    }
}

/// `year -> group -> outcome tallies`.
pub type OutcomeSeries = BTreeMap<i32, BTreeMap<String, OutcomeCounts>>;

/// Screening overrides for one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideCounts {
    /// Screenings with a recorded score.
    pub total_with_score: u64,
    /// Scored screenings whose recommendation was overridden.
    pub total_with_override: u64,
    pub percent_with_override: f64,
}

impl OverrideCounts {
    /// Builds tallies and the override rate from raw counts.
    #[must_use]
    pub fn new(total_with_score: u64, total_with_override: u64) -> Self {
        Self {
            total_with_score,
            total_with_override,
            percent_with_override: percent_of(total_with_override, total_with_score),
        }
    }
}

/// `year -> override tallies`.
pub type OverrideSeries = BTreeMap<i32, OverrideCounts>;

/// `year -> override reason -> screenings`.
pub type OverrideReasonSeries = BTreeMap<i32, BTreeMap<String, u64>>;

/// A length-of-stay band for distribution charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LosBand {
    pub label: String,
    /// Inclusive lower bound in days.
    pub min_days: u32,
    /// Inclusive upper bound in days; `None` for the last band.
    pub max_days: Option<u32>,
}

impl LosBand {
    /// Creates a band.
    #[must_use]
    pub fn new(label: &str, min_days: u32, max_days: Option<u32>) -> Self {
        Self {
            label: label.to_string(),
            min_days,
            max_days,
        }
    }

    /// Returns `true` if `days` falls in this band.
    #[must_use]
    pub fn contains(&self, days: u32) -> bool {
        days >= self.min_days && self.max_days.is_none_or(|max| days <= max)
    }

    /// The bands used by the LOS distribution charts.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("1-3 days", 1, Some(3)),
            Self::new("4-7 days", 4, Some(7)),
            Self::new("8-14 days", 8, Some(14)),
            Self::new("15-30 days", 15, Some(30)),
            Self::new("31-60 days", 31, Some(60)),
            Self::new("61-90 days", 61, Some(90)),
            Self::new("91+ days", 91, None),
        ]
    }
}
