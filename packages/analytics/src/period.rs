//! Admission and release counts.

use detention_stats_analytics_models::{AggregationResult, DateAxis};
use detention_stats_stay_models::StayRecord;

use crate::{
    AggregationScope, AnalyticsError,
    breakdown::Categorizer,
    fold::{EventCount, fold_window},
};

/// Counts records whose `axis` date falls in the scope's window, by
/// category and phase. Categories known to `categorizer` are zero-filled.
/// The baseline is the same count over the preceding year.
///
/// # Errors
///
/// * If `categorizer` is not supported for the scope's detention type
pub fn count_by_category<C: Categorizer + ?Sized>(
    records: &[StayRecord],
    scope: &AggregationScope,
    categorizer: &C,
    axis: DateAxis,
) -> Result<AggregationResult<u64>, AnalyticsError> {
    let metric = EventCount(axis);
    let current = fold_window(records, scope, categorizer, &metric)?;
    let previous = fold_window(records, &scope.previous_period(), categorizer, &metric)?;

    log::debug!(
        "{axis:?} count for {}: {} (previous {})",
        scope.window,
        current.qualifying,
        previous.qualifying
    );

    Ok(AggregationResult {
        total: current.overall.pre + current.overall.post,
        previous_period_baseline: previous.overall.pre + previous.overall.post,
        by_category: current.buckets(|count| *count),
    })
}

/// Admissions: records whose entry date falls in the window.
///
/// # Errors
///
/// * If `categorizer` is not supported for the scope's detention type
pub fn admissions<C: Categorizer + ?Sized>(
    records: &[StayRecord],
    scope: &AggregationScope,
    categorizer: &C,
) -> Result<AggregationResult<u64>, AnalyticsError> {
    count_by_category(records, scope, categorizer, DateAxis::Entry)
}

/// Releases: records whose exit date falls in the window.
///
/// # Errors
///
/// * If `categorizer` is not supported for the scope's detention type
pub fn releases<C: Categorizer + ?Sized>(
    records: &[StayRecord],
    scope: &AggregationScope,
    categorizer: &C,
) -> Result<AggregationResult<u64>, AnalyticsError> {
    count_by_category(records, scope, categorizer, DateAxis::Exit)
}
