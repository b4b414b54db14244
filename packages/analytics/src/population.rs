//! Average daily population.

use detention_stats_analytics_models::AggregationResult;
use detention_stats_stay_models::StayRecord;

use crate::{
    AggregationScope, AnalyticsError, Breakdown,
    breakdown::Categorizer,
    fold::{OverlapDays, fold_records, fold_window},
};

/// Total days of stays that fall inside the scope's window.
pub fn total_overlap_days(records: &[StayRecord], scope: &AggregationScope) -> u64 {
    let fold = fold_records(records, scope, &Breakdown::Overall, &OverlapDays);
    fold.overall.pre + fold.overall.post
}

#[allow(clippy::cast_precision_loss)]
fn per_day(days: u64, scope: &AggregationScope) -> f64 {
    days as f64 / f64::from(scope.window.days_in_window())
}

/// Average daily population by category and phase.
///
/// Each stay contributes its in-window days divided by the window's day
/// count, so the contributions of any complete slicing sum to the same
/// total. The baseline is the unsliced figure for the preceding year.
///
/// # Errors
///
/// * If `categorizer` is not supported for the scope's detention type
pub fn average_daily_population<C: Categorizer + ?Sized>(
    records: &[StayRecord],
    scope: &AggregationScope,
    categorizer: &C,
) -> Result<AggregationResult<f64>, AnalyticsError> {
    let current = fold_window(records, scope, categorizer, &OverlapDays)?;
    let previous_scope = scope.previous_period();
    let previous_days = total_overlap_days(records, &previous_scope);

    let total = per_day(current.overall.pre + current.overall.post, scope);
    log::debug!(
        "Average daily population for {}: {total:.3} from {} stays",
        scope.window,
        current.qualifying
    );

    Ok(AggregationResult {
        total,
        previous_period_baseline: per_day(previous_days, &previous_scope),
        by_category: current.buckets(|&days| per_day(days, scope)),
    })
}
