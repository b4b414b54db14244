//! Length-of-stay statistics and distributions.

use detention_stats_analytics_models::{
    CategoryBucket, LengthOfStayResult, LosBand, LosCategoryBucket, LosStatistic, LosSummary,
};
use detention_stats_stay_models::{DetentionType, StayRecord};

use crate::{
    AggregationScope, AnalyticsError, Breakdown,
    breakdown::{ALL_GROUP, Categorizer},
    fold::{LengthOfStaySamples, Split, fold_records, fold_window},
    interval::length_of_stay,
};

/// Arithmetic mean, or `None` for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean<T: Copy + Into<f64>>(values: &[T]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().map(|&v| v.into()).sum();
    Some(sum / values.len() as f64)
}

/// Median, or `None` for an empty slice. Even-length input averages the
/// two central values.
#[must_use]
pub fn median<T: Copy + Into<f64>>(values: &[T]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().map(|&v| v.into()).collect();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    match sorted.len() {
        0 => None,
        len if len % 2 == 1 => Some(sorted[mid]),
        _ => Some((sorted[mid - 1] + sorted[mid]) / 2.0),
    }
}

/// Applies `statistic` to `samples`.
#[must_use]
pub fn summarize(samples: &[u32], statistic: LosStatistic) -> LosSummary {
    let value = match statistic {
        LosStatistic::Mean => mean(samples),
        LosStatistic::Median => median(samples),
    };
    LosSummary {
        value,
        count: samples.len(),
    }
}

fn summarize_split(
    category: String,
    split: Split<Vec<u32>>,
    statistic: LosStatistic,
) -> LosCategoryBucket {
    let pre = summarize(&split.pre, statistic);
    let post = summarize(&split.post, statistic);
    let all = summarize(&split.combined(&LengthOfStaySamples), statistic);
    LosCategoryBucket {
        category,
        pre,
        post,
        all,
    }
}

/// Mean or median length of stay of records released in the window, by
/// category and phase, with pooled per-category figures.
///
/// Records with a positive length of stay qualify. The baseline is a
/// single unsliced figure over the preceding year.
///
/// # Errors
///
/// * If `categorizer` is not supported for the scope's detention type
pub fn average_or_median_los<C: Categorizer + ?Sized>(
    records: &[StayRecord],
    scope: &AggregationScope,
    categorizer: &C,
    statistic: LosStatistic,
) -> Result<LengthOfStayResult, AnalyticsError> {
    let current = fold_window(records, scope, categorizer, &LengthOfStaySamples)?;
    let previous = fold_records(
        records,
        &scope.previous_period(),
        &Breakdown::Overall,
        &LengthOfStaySamples,
    );

    let overall = summarize_split(ALL_GROUP.to_string(), current.overall, statistic);
    let baseline = summarize(&previous.overall.combined(&LengthOfStaySamples), statistic);

    log::debug!(
        "{statistic} length of stay for {}: {:?} over {} releases",
        scope.window,
        overall.all.value,
        overall.all.count
    );

    Ok(LengthOfStayResult {
        statistic,
        total: overall.all.value,
        previous_period_baseline: baseline.value,
        previous_period_count: baseline.count,
        overall,
        by_category: current
            .categories
            .into_iter()
            .map(|(category, split)| summarize_split(category, split, statistic))
            .collect(),
    })
}

/// Mean length of stay. See [`average_or_median_los`].
///
/// # Errors
///
/// * If `categorizer` is not supported for the scope's detention type
pub fn average_length_of_stay<C: Categorizer + ?Sized>(
    records: &[StayRecord],
    scope: &AggregationScope,
    categorizer: &C,
) -> Result<LengthOfStayResult, AnalyticsError> {
    average_or_median_los(records, scope, categorizer, LosStatistic::Mean)
}

/// Median length of stay. See [`average_or_median_los`].
///
/// # Errors
///
/// * If `categorizer` is not supported for the scope's detention type
pub fn median_length_of_stay<C: Categorizer + ?Sized>(
    records: &[StayRecord],
    scope: &AggregationScope,
    categorizer: &C,
) -> Result<LengthOfStayResult, AnalyticsError> {
    average_or_median_los(records, scope, categorizer, LosStatistic::Median)
}

/// Buckets a length of stay into the first band that contains it.
struct BandCategorizer<'a> {
    bands: &'a [LosBand],
}

impl Categorizer for BandCategorizer<'_> {
    fn categorize(&self, record: &StayRecord, detention_type: DetentionType) -> Option<String> {
        let dates = record.stay_dates(detention_type);
        let days = u32::try_from(length_of_stay(dates.entry, dates.exit)?).ok()?;
        self.bands
            .iter()
            .find(|band| band.contains(days))
            .map(|band| band.label.clone())
    }

    fn known_categories(&self) -> Vec<String> {
        self.bands.iter().map(|band| band.label.clone()).collect()
    }
}

/// Number of releases in the window per length-of-stay band, split by
/// phase. Stays outside every band are not counted.
pub fn los_distribution(
    records: &[StayRecord],
    scope: &AggregationScope,
    bands: &[LosBand],
) -> Vec<CategoryBucket<u64>> {
    let fold = fold_records(records, scope, &BandCategorizer { bands }, &LengthOfStaySamples);
    fold.buckets(|samples| samples.len() as u64)
}
