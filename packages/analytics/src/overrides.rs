//! Detention screening overrides.
//!
//! A screening is dated by `Intake_Date`, or by the stay's entry date when
//! no intake date was recorded. Override rates only count screenings with
//! a recorded score; reason counts take every screening with a reason.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Datelike as _;
use detention_stats_analytics_models::{OverrideCounts, OverrideReasonSeries, OverrideSeries};
use detention_stats_stay_models::{DetentionType, StayDates, StayRecord};
use detention_stats_taxonomy::classify_override_reason;

use crate::{
    AggregationScope, AnalyticsError, ReportingWindow,
    breakdown::{ALL_GROUP, Breakdown, Categorizer},
    fold::{WindowMetric, fold_window},
};

/// What one screening contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Screening {
    pub scored: bool,
    pub overridden: bool,
}

/// Running screening totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScreeningTally {
    /// Every screening in the group.
    pub screenings: u64,
    /// Screenings with a score.
    pub scored: u64,
    /// Scored screenings that were overridden.
    pub scored_overridden: u64,
}

/// Screenings dated inside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Screenings;

impl WindowMetric for Screenings {
    type Sample = Screening;
    type Acc = ScreeningTally;

    fn sample(
        &self,
        record: &StayRecord,
        dates: StayDates,
        window: &ReportingWindow,
    ) -> Option<Screening> {
        let date = record.intake_date.valid().or(dates.entry)?;
        window.contains(date).then(|| Screening {
            scored: record.has_screening_score(),
            overridden: classify_override_reason(record.override_reason.as_deref()).is_some(),
        })
    }

    fn accumulate(&self, acc: &mut ScreeningTally, sample: Screening) {
        acc.screenings += 1;
        if sample.scored {
            acc.scored += 1;
            if sample.overridden {
                acc.scored_overridden += 1;
            }
        }
    }

    fn merge(&self, into: &mut ScreeningTally, from: ScreeningTally) {
        into.screenings += from.screenings;
        into.scored += from.scored;
        into.scored_overridden += from.scored_overridden;
    }
}

/// Override rate of scored screenings in one window, per group.
///
/// # Errors
///
/// * If `categorizer` is not supported for the scope's detention type
pub fn override_rates<C: Categorizer + ?Sized>(
    records: &[StayRecord],
    scope: &AggregationScope,
    categorizer: &C,
) -> Result<BTreeMap<String, OverrideCounts>, AnalyticsError> {
    Ok(fold_window(records, scope, categorizer, &Screenings)?
        .categories
        .into_iter()
        .map(|(group, split)| {
            let tally = split.combined(&Screenings);
            (group, OverrideCounts::new(tally.scored, tally.scored_overridden))
        })
        .collect())
}

/// Years in which a screening matching `qualifies` took place.
fn screening_years(
    records: &[StayRecord],
    detention_type: DetentionType,
    program: Option<&str>,
    qualifies: impl Fn(&StayRecord) -> bool,
) -> BTreeSet<i32> {
    let program = program.map(str::trim).filter(|p| !p.is_empty());

    records
        .iter()
        .filter(|&record| program.is_none_or(|p| record.matches_program(p)) && qualifies(record))
        .filter_map(|record| record.screening_date(detention_type))
        .map(|date| date.year())
        .collect()
}

/// Scored screenings and overrides for every year with a scored screening.
///
/// # Errors
///
/// * If a year present in the data cannot be represented as a window
pub fn overrides_by_year(
    records: &[StayRecord],
    detention_type: DetentionType,
    program: Option<&str>,
) -> Result<OverrideSeries, AnalyticsError> {
    let years =
        screening_years(records, detention_type, program, StayRecord::has_screening_score);
    log::debug!("Building override rates over {} years", years.len());

    let mut series = OverrideSeries::new();
    for year in years {
        let scope = AggregationScope::calendar_year(year, detention_type)?.with_program(program);
        let mut rates = override_rates(records, &scope, &Breakdown::Overall)?;
        if let Some(counts) = rates.remove(ALL_GROUP) {
            series.insert(year, counts);
        }
    }

    Ok(series)
}

/// Screenings per normalized override reason for every year with an
/// override. Reasons mentioning "other" are pooled.
///
/// # Errors
///
/// * If a year present in the data cannot be represented as a window
pub fn override_reasons_by_year(
    records: &[StayRecord],
    detention_type: DetentionType,
    program: Option<&str>,
) -> Result<OverrideReasonSeries, AnalyticsError> {
    let by_reason = |record: &StayRecord, _: DetentionType| {
        classify_override_reason(record.override_reason.as_deref())
    };
    let years = screening_years(records, detention_type, program, |record| {
        by_reason(record, detention_type).is_some()
    });

    let mut series = OverrideReasonSeries::new();
    for year in years {
        let scope = AggregationScope::calendar_year(year, detention_type)?.with_program(program);
        let reasons = fold_window(records, &scope, &by_reason, &Screenings)?
            .categories
            .into_iter()
            .map(|(reason, split)| (reason, split.combined(&Screenings).screenings))
            .collect();
        series.insert(year, reasons);
    }

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{approx_eq, secure, text};
    use detention_stats_stay_models::DateField;

    fn screened(intake: &str, score: Option<&str>, reason: Option<&str>) -> StayRecord {
        let mut record = secure("2020-01-01", None);
        record.intake_date = DateField::parse(intake);
        record.dst_score = score.map(ToString::to_string);
        record.override_reason = reason.map(ToString::to_string);
        record
    }

    fn records() -> Vec<StayRecord> {
        vec![
            screened("2023-02-01", Some("10"), Some("Mandatory hold")),
            screened("2023-03-01", Some("4"), None),
            screened("2023-04-01", Some("7"), Some("Other - parent request")),
            screened("2023-05-01", Some("12"), None),
            screened("2023-06-01", None, Some("Other: no placement")),
            screened("2024-01-15", Some(" "), None),
            screened("2024-02-15", Some("9"), Some("  ")),
        ]
    }

    #[test]
    fn override_rate_counts_scored_screenings_only() {
        let series = overrides_by_year(&records(), DetentionType::SecureDetention, None).unwrap();

        assert_eq!(series.keys().copied().collect::<Vec<_>>(), vec![2023, 2024]);
        let counts_2023 = series[&2023];
        assert_eq!(counts_2023.total_with_score, 4);
        assert_eq!(counts_2023.total_with_override, 2);
        assert!(approx_eq(counts_2023.percent_with_override, 50.0));

        let counts_2024 = series[&2024];
        assert_eq!(counts_2024.total_with_score, 1, "blank scores are not scores");
        assert_eq!(counts_2024.total_with_override, 0, "blank reasons are not overrides");
    }

    #[test]
    fn reasons_mentioning_other_are_pooled() {
        let series =
            override_reasons_by_year(&records(), DetentionType::SecureDetention, None).unwrap();

        assert_eq!(series.keys().copied().collect::<Vec<_>>(), vec![2023]);
        let reasons = &series[&2023];
        assert_eq!(reasons.get("Other"), Some(&2));
        assert_eq!(reasons.get("Mandatory hold"), Some(&1));
        assert_eq!(reasons.len(), 2);
    }

    #[test]
    fn screening_date_falls_back_to_entry_date() {
        let mut record = secure("2024-05-01", None);
        record.dst_score = text("11");
        record.override_reason = text("Detention alternative unavailable");

        let scope = AggregationScope::calendar_year(2024, DetentionType::SecureDetention).unwrap();
        let rates = override_rates(&[record], &scope, &Breakdown::Overall).unwrap();
        assert_eq!(rates[ALL_GROUP], OverrideCounts::new(1, 1));
    }

    #[test]
    fn override_rates_by_breakdown_group() {
        let mut records = records();
        records[0].screened = text("Screened");
        records[1].screened = text("Screened");

        let scope = AggregationScope::calendar_year(2023, DetentionType::SecureDetention).unwrap();
        let rates = override_rates(&records, &scope, &Breakdown::ScreenedStatus).unwrap();

        assert_eq!(rates["Screened"], OverrideCounts::new(2, 1));
        assert_eq!(rates["Unknown"], OverrideCounts::new(2, 1));
    }

    #[test]
    fn program_filter_limits_overrides() {
        let mut records = records();
        records[0].facility = text("North Hall");

        let series =
            overrides_by_year(&records, DetentionType::SecureDetention, Some("north hall"))
                .unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[&2023], OverrideCounts::new(1, 1));
    }
}
