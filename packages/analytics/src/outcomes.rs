//! ATD exit outcomes.

use std::collections::BTreeMap;

use detention_stats_analytics_models::{AggregationResult, DateAxis, OutcomeCounts, OutcomeSeries};
use detention_stats_stay_models::{DetentionType, StayDates, StayRecord};
use detention_stats_taxonomy::ExitOutcome;

use crate::{
    AggregationScope, AnalyticsError, ReportingWindow,
    breakdown::{Breakdown, Categorizer},
    fold::{WindowMetric, fold_window},
    period::count_by_category,
    time_series::years_present,
};

/// Successful/unsuccessful tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeTally {
    pub successful: u64,
    pub unsuccessful: u64,
}

/// Outcome of every stay that exits in the window. A missing or
/// unrecognized flag counts as unsuccessful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcomes;

impl WindowMetric for ExitOutcomes {
    type Sample = ExitOutcome;
    type Acc = OutcomeTally;

    fn sample(
        &self,
        record: &StayRecord,
        dates: StayDates,
        window: &ReportingWindow,
    ) -> Option<ExitOutcome> {
        dates.entry?;
        let exit = dates.exit?;
        window
            .contains(exit)
            .then(|| ExitOutcome::from_flag(record.successful_exit()))
    }

    fn accumulate(&self, acc: &mut OutcomeTally, sample: ExitOutcome) {
        match sample {
            ExitOutcome::Successful => acc.successful += 1,
            ExitOutcome::Unsuccessful => acc.unsuccessful += 1,
        }
    }

    fn merge(&self, into: &mut OutcomeTally, from: OutcomeTally) {
        into.successful += from.successful;
        into.unsuccessful += from.unsuccessful;
    }
}

/// Exit outcomes in one window per group, phases combined.
///
/// # Errors
///
/// * If `categorizer` is not supported for the scope's detention type
pub fn exit_outcomes<C: Categorizer + ?Sized>(
    records: &[StayRecord],
    scope: &AggregationScope,
    categorizer: &C,
) -> Result<BTreeMap<String, OutcomeCounts>, AnalyticsError> {
    Ok(fold_window(records, scope, categorizer, &ExitOutcomes)?
        .categories
        .into_iter()
        .map(|(group, split)| {
            let tally = split.combined(&ExitOutcomes);
            (group, OutcomeCounts::new(tally.successful, tally.unsuccessful))
        })
        .collect())
}

/// ATD exit outcomes for every year with exits, per breakdown group.
///
/// # Errors
///
/// * If `breakdown` is not supported for ATD
/// * If a year present in the data cannot be represented as a window
pub fn exit_outcomes_by_year(
    records: &[StayRecord],
    breakdown: &Breakdown,
    program: Option<&str>,
) -> Result<OutcomeSeries, AnalyticsError> {
    let detention_type = DetentionType::AlternativeToDetention;
    let mut series = OutcomeSeries::new();

    for year in years_present(records, detention_type, DateAxis::Exit, program) {
        let scope = AggregationScope::calendar_year(year, detention_type)?.with_program(program);
        series.insert(year, exit_outcomes(records, &scope, breakdown)?);
    }

    Ok(series)
}

/// Slices unsuccessful exits by disruption type and leaves successful
/// ones out.
struct UnsuccessfulExits;

impl Categorizer for UnsuccessfulExits {
    fn categorize(&self, record: &StayRecord, detention_type: DetentionType) -> Option<String> {
        (ExitOutcome::from_flag(record.successful_exit()) == ExitOutcome::Unsuccessful)
            .then(|| Breakdown::DisruptionType.label(record, detention_type))
    }

    fn known_categories(&self) -> Vec<String> {
        Breakdown::DisruptionType.known_categories()
    }

    fn ensure_supported(&self, detention_type: DetentionType) -> Result<(), AnalyticsError> {
        Breakdown::DisruptionType.ensure_supported(detention_type)
    }
}

/// Unsuccessful ATD exits in the window by disruption type and phase.
///
/// An exit flagged with several disruption types counts under the first
/// of FTA, new offense, technical and other. Unsuccessful exits with no
/// flag are reported as "No Disruption". The baseline is the same count
/// over the preceding year.
///
/// # Errors
///
/// * If the scope is not an ATD scope
pub fn exits_by_disruption_type(
    records: &[StayRecord],
    scope: &AggregationScope,
) -> Result<AggregationResult<u64>, AnalyticsError> {
    count_by_category(records, scope, &UnsuccessfulExits, DateAxis::Exit)
}
