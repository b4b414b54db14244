//! The windowed fold shared by every aggregator.
//!
//! A fold walks the records of one scope once. For each record a
//! [`WindowMetric`] decides whether it qualifies and what it contributes;
//! a [`Categorizer`] picks the category and the post-dispo stay reason
//! picks the phase. Aggregators differ only in the metric they plug in.

use std::collections::BTreeMap;

use detention_stats_analytics_models::{CategoryBucket, DateAxis};
use detention_stats_stay_models::{DispoStatus, StayDates, StayRecord};
use detention_stats_taxonomy::classify_dispo_status;

use crate::{
    AggregationScope, AnalyticsError, ReportingWindow,
    breakdown::{Categorizer, presentation_order},
    interval::{length_of_stay, overlap_days},
};

/// How one metric extracts and combines per-record contributions.
pub trait WindowMetric {
    /// Contribution of one qualifying record.
    type Sample: Copy;
    /// Running total of a group of records.
    type Acc: Default;

    /// Contribution of `record`, or `None` if it does not qualify for
    /// `window`. Records without an entry date never qualify.
    fn sample(
        &self,
        record: &StayRecord,
        dates: StayDates,
        window: &ReportingWindow,
    ) -> Option<Self::Sample>;

    fn accumulate(&self, acc: &mut Self::Acc, sample: Self::Sample);

    /// Folds `from` into `into`.
    fn merge(&self, into: &mut Self::Acc, from: Self::Acc);
}

/// Pre-/post-dispo halves of an accumulator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Split<A> {
    pub pre: A,
    pub post: A,
}

impl<A> Split<A> {
    /// The half that `status` routes to.
    pub const fn get_mut(&mut self, status: DispoStatus) -> &mut A {
        match status {
            DispoStatus::PreDispo => &mut self.pre,
            DispoStatus::PostDispo => &mut self.post,
        }
    }

    /// Both halves merged into one accumulator.
    pub fn combined<M: WindowMetric<Acc = A>>(self, metric: &M) -> A {
        let mut all = self.pre;
        metric.merge(&mut all, self.post);
        all
    }
}

/// Result of one fold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold<A> {
    /// Every qualifying record, split by phase only.
    pub overall: Split<A>,
    /// Per-category splits in presentation order.
    pub categories: Vec<(String, Split<A>)>,
    /// Number of records that contributed.
    pub qualifying: usize,
}

impl<A> Fold<A> {
    /// Converts each category's halves with `f`.
    pub fn buckets<T>(&self, f: impl Fn(&A) -> T) -> Vec<CategoryBucket<T>> {
        self.categories
            .iter()
            .map(|(category, split)| CategoryBucket {
                category: category.clone(),
                pre: f(&split.pre),
                post: f(&split.post),
            })
            .collect()
    }
}

/// Folds `records` for `scope`, slicing by `categorizer`.
///
/// # Errors
///
/// * If `categorizer` is not supported for the scope's detention type
pub fn fold_window<C, M>(
    records: &[StayRecord],
    scope: &AggregationScope,
    categorizer: &C,
    metric: &M,
) -> Result<Fold<M::Acc>, AnalyticsError>
where
    C: Categorizer + ?Sized,
    M: WindowMetric,
{
    categorizer.ensure_supported(scope.detention_type)?;
    Ok(fold_records(records, scope, categorizer, metric))
}

/// [`fold_window`] for categorizers that hold for every detention type.
pub(crate) fn fold_records<C, M>(
    records: &[StayRecord],
    scope: &AggregationScope,
    categorizer: &C,
    metric: &M,
) -> Fold<M::Acc>
where
    C: Categorizer + ?Sized,
    M: WindowMetric,
{
    let mut overall = Split::default();
    let mut by_category: BTreeMap<String, Split<M::Acc>> = BTreeMap::new();
    let mut qualifying = 0;
    let mut unparseable = 0;

    for record in records.iter().filter(|record| scope.includes(record)) {
        let dates = record.stay_dates(scope.detention_type);
        if dates.unparseable {
            unparseable += 1;
        }

        let Some(sample) = metric.sample(record, dates, &scope.window) else {
            continue;
        };
        let Some(category) = categorizer.categorize(record, scope.detention_type) else {
            continue;
        };
        let status = classify_dispo_status(record.post_dispo_stay_reason.as_deref());

        metric.accumulate(by_category.entry(category).or_default().get_mut(status), sample);
        metric.accumulate(overall.get_mut(status), sample);
        qualifying += 1;
    }

    if unparseable > 0 {
        log::debug!(
            "{unparseable} {} records had unparseable dates and were skipped",
            scope.detention_type
        );
    }
    log::debug!(
        "Folded {qualifying} qualifying {} records for {}",
        scope.detention_type,
        scope.window
    );

    let order = presentation_order(categorizer.known_categories(), by_category.keys());
    let categories = order
        .into_iter()
        .map(|category| {
            let split = by_category.remove(&category).unwrap_or_default();
            (category, split)
        })
        .collect();

    Fold {
        overall,
        categories,
        qualifying,
    }
}

/// Records whose entry or exit date falls in the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventCount(pub DateAxis);

impl WindowMetric for EventCount {
    type Sample = ();
    type Acc = u64;

    fn sample(&self, _: &StayRecord, dates: StayDates, window: &ReportingWindow) -> Option<()> {
        let entry = dates.entry?;
        let date = match self.0 {
            DateAxis::Entry => entry,
            DateAxis::Exit => dates.exit?,
        };
        window.contains(date).then_some(())
    }

    fn accumulate(&self, acc: &mut u64, (): ()) {
        *acc += 1;
    }

    fn merge(&self, into: &mut u64, from: u64) {
        *into += from;
    }
}

/// Length of stay of records released in the window. Stays whose
/// recorded exit does not follow the entry are left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthOfStaySamples;

impl WindowMetric for LengthOfStaySamples {
    type Sample = u32;
    type Acc = Vec<u32>;

    fn sample(&self, _: &StayRecord, dates: StayDates, window: &ReportingWindow) -> Option<u32> {
        let exit = dates.exit?;
        if !window.contains(exit) {
            return None;
        }
        length_of_stay(dates.entry, dates.exit)
            .filter(|&days| days > 0)
            .and_then(|days| u32::try_from(days).ok())
    }

    fn accumulate(&self, acc: &mut Vec<u32>, sample: u32) {
        acc.push(sample);
    }

    fn merge(&self, into: &mut Vec<u32>, from: Vec<u32>) {
        into.extend(from);
    }
}

/// Days of each stay that fall inside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapDays;

impl WindowMetric for OverlapDays {
    type Sample = u32;
    type Acc = u64;

    fn sample(&self, _: &StayRecord, dates: StayDates, window: &ReportingWindow) -> Option<u32> {
        let days = overlap_days(dates.entry, dates.exit, window.start(), window.end());
        (days > 0).then_some(days)
    }

    fn accumulate(&self, acc: &mut u64, sample: u32) {
        *acc += u64::from(sample);
    }

    fn merge(&self, into: &mut u64, from: u64) {
        *into += from;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Breakdown,
        test_support::{secure, text},
    };
    use detention_stats_analytics_models::BreakdownDimension;
    use detention_stats_stay_models::{DateField, DetentionType};
    use detention_stats_taxonomy::age::{ADMISSION_SCHEME, scheme};

    fn scope_2024() -> AggregationScope {
        AggregationScope::calendar_year(2024, DetentionType::SecureDetention).unwrap()
    }

    fn sample_records() -> Vec<StayRecord> {
        let mut records = vec![
            secure("2024-01-05", Some("2024-01-09")),
            secure("2024-02-01", Some("2024-03-01")),
            secure("2024-03-15", None),
            secure("2023-12-20", Some("2024-01-02")),
            secure("2024-06-01", Some("2024-06-01")),
            secure("2024-11-30", Some("2025-01-10")),
            secure("2022-01-01", Some("2022-02-01")),
            secure("not a date", Some("2024-04-01")),
            StayRecord::default(),
        ];
        let details = [
            (Some("Felony Person"), None, Some("Male"), Some("2009-03-01")),
            (Some("Warrant"), Some("Awaiting placement"), Some("Female"), Some("2006-01-01")),
            (Some("Misdemeanor"), None, None, None),
            (Some("Status Offense"), Some("Other"), Some("Male"), Some("2011-07-04")),
            (None, None, Some("Female"), Some("2007-12-31")),
            (Some("Probation Violation"), Some("Confinement"), Some("X"), Some("2008-08-08")),
            (Some("Felony"), None, Some("Male"), None),
            (Some("Felony"), None, Some("Male"), None),
            (None, None, None, None),
        ];
        for (record, (offense, reason, gender, birth)) in records.iter_mut().zip(details) {
            record.offense_category = offense.map(ToString::to_string);
            record.post_dispo_stay_reason = reason.map(ToString::to_string);
            record.gender = gender.map(ToString::to_string);
            record.date_of_birth = birth.map_or(DateField::Missing, DateField::parse);
        }
        records
    }

    fn breakdowns() -> Vec<Breakdown> {
        BreakdownDimension::all()
            .iter()
            .map(|&dimension| {
                Breakdown::from_dimension(dimension, Some(scheme(ADMISSION_SCHEME).unwrap()))
                    .unwrap()
            })
            .filter(|breakdown| breakdown.ensure_supported(DetentionType::SecureDetention).is_ok())
            .collect()
    }

    #[test]
    fn counts_are_conserved_across_every_breakdown() {
        let records = sample_records();
        let scope = scope_2024();

        for axis in [DateAxis::Entry, DateAxis::Exit] {
            for breakdown in breakdowns() {
                let fold = fold_window(&records, &scope, &breakdown, &EventCount(axis)).unwrap();
                let by_category: u64 = fold
                    .categories
                    .iter()
                    .map(|(_, split)| split.pre + split.post)
                    .sum();
                let qualifying = fold.qualifying as u64;

                assert_eq!(
                    by_category, qualifying,
                    "{axis:?} counts by {:?} lost or duplicated records",
                    breakdown.dimension()
                );
                assert_eq!(fold.overall.pre + fold.overall.post, qualifying);
            }
        }
    }

    #[test]
    fn qualifying_counts_per_axis() {
        let records = sample_records();
        let scope = scope_2024();

        let admissions = fold_window(
            &records,
            &scope,
            &Breakdown::Overall,
            &EventCount(DateAxis::Entry),
        )
        .unwrap();
        assert_eq!(admissions.qualifying, 5, "entries dated in 2024");

        let releases = fold_window(
            &records,
            &scope,
            &Breakdown::Overall,
            &EventCount(DateAxis::Exit),
        )
        .unwrap();
        assert_eq!(releases.qualifying, 4, "exits dated in 2024 with a valid entry");
    }

    #[test]
    fn each_record_lands_in_exactly_one_phase() {
        let record = {
            let mut r = secure("2024-01-01", Some("2024-01-10"));
            r.post_dispo_stay_reason = text("Awaiting placement");
            r
        };
        let fold = fold_window(
            &[record],
            &scope_2024(),
            &Breakdown::Overall,
            &EventCount(DateAxis::Entry),
        )
        .unwrap();
        assert_eq!(fold.overall, Split { pre: 0, post: 1 });
    }

    #[test]
    fn known_categories_are_zero_filled_in_order() {
        let records = vec![secure("2024-01-01", None)];
        let fold = fold_window(
            &records,
            &scope_2024(),
            &Breakdown::OffenseCategory,
            &EventCount(DateAxis::Entry),
        )
        .unwrap();
        let labels: Vec<&str> = fold.categories.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "New Offense",
                "Technical",
                "Awaiting Placement",
                "Confinement to Secure Detention",
                "Other"
            ]
        );
        assert_eq!(fold.categories[1].1, Split { pre: 1, post: 0 });
        assert_eq!(fold.categories[0].1, Split { pre: 0, post: 0 });
    }

    #[test]
    fn categorizer_can_exclude_records() {
        let mut with_county = secure("2024-01-01", None);
        with_county.county_name = text("Adams");
        let records = vec![with_county, secure("2024-02-01", None)];

        let by_county = |record: &StayRecord, _: DetentionType| record.county_name.clone();
        let fold = fold_window(
            &records,
            &scope_2024(),
            &by_county,
            &EventCount(DateAxis::Entry),
        )
        .unwrap();

        assert_eq!(fold.qualifying, 1);
        assert_eq!(fold.categories.len(), 1);
        assert_eq!(fold.categories[0].0, "Adams");
    }

    #[test]
    fn program_filter_applies_before_folding() {
        let mut north = secure("2024-01-01", None);
        north.facility = text("North");
        let mut south = secure("2024-01-02", None);
        south.facility = text("South");

        let scope = scope_2024().with_program(Some("south"));
        let fold = fold_window(
            &[north, south],
            &scope,
            &Breakdown::Facility,
            &EventCount(DateAxis::Entry),
        )
        .unwrap();

        assert_eq!(fold.qualifying, 1);
        assert_eq!(fold.categories[0].0, "South");
    }

    #[test]
    fn non_positive_length_of_stay_is_excluded() {
        let records = vec![
            secure("2024-03-10", Some("2024-03-01")),
            secure("2024-03-01", Some("2024-03-03")),
        ];
        let fold =
            fold_window(&records, &scope_2024(), &Breakdown::Overall, &LengthOfStaySamples)
                .unwrap();
        assert_eq!(fold.qualifying, 1);
        assert_eq!(fold.overall.pre, vec![3]);
    }

    #[test]
    fn atd_only_breakdowns_are_rejected_for_secure_detention() {
        let records = vec![secure("2024-01-01", None)];
        for breakdown in [Breakdown::SuccessFailure, Breakdown::DisruptionType] {
            let result = fold_window(
                &records,
                &scope_2024(),
                &breakdown,
                &EventCount(DateAxis::Entry),
            );
            assert!(
                matches!(result, Err(AnalyticsError::UnsupportedBreakdown { .. })),
                "{:?} should be rejected for secure detention",
                breakdown.dimension()
            );
        }
    }

    #[test]
    fn combined_merges_both_phases() {
        let split = Split {
            pre: vec![1, 2],
            post: vec![3],
        };
        assert_eq!(split.combined(&LengthOfStaySamples), vec![1, 2, 3]);
    }
}
