//! Multi-year trend series.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Datelike as _;
use detention_stats_analytics_models::{DateAxis, LosStatistic, YearMetrics, YearSeries};
use detention_stats_stay_models::{DetentionType, StayRecord};

use crate::{
    AggregationScope, AnalyticsError,
    breakdown::Breakdown,
    fold::{EventCount, LengthOfStaySamples, OverlapDays, fold_window},
    statistics::summarize,
};

/// Calendar years in which some record's `axis` date falls, after the
/// program filter. Feeds year selectors as well as trend series.
pub fn years_present(
    records: &[StayRecord],
    detention_type: DetentionType,
    axis: DateAxis,
    program: Option<&str>,
) -> BTreeSet<i32> {
    let program = program.map(str::trim).filter(|p| !p.is_empty());

    records
        .iter()
        .filter(|record| program.is_none_or(|p| record.matches_program(p)))
        .filter_map(|record| {
            let dates = record.stay_dates(detention_type);
            match axis {
                DateAxis::Entry => dates.entry,
                DateAxis::Exit => dates.entry.and(dates.exit),
            }
        })
        .map(|date| date.year())
        .collect()
}

/// Every metric family for each group of one year.
#[allow(clippy::cast_precision_loss)]
fn year_metrics(
    records: &[StayRecord],
    scope: &AggregationScope,
    breakdown: &Breakdown,
) -> Result<BTreeMap<String, YearMetrics>, AnalyticsError> {
    let mut groups: BTreeMap<String, YearMetrics> = BTreeMap::new();

    for axis in [DateAxis::Entry, DateAxis::Exit] {
        let metric = EventCount(axis);
        for (group, split) in fold_window(records, scope, breakdown, &metric)?.categories {
            let entry = groups.entry(group).or_default();
            let count = split.combined(&metric);
            match axis {
                DateAxis::Entry => entry.admissions = count,
                DateAxis::Exit => entry.releases = count,
            }
        }
    }

    let los = fold_window(records, scope, breakdown, &LengthOfStaySamples)?;
    for (group, split) in los.categories {
        let samples = split.combined(&LengthOfStaySamples);
        let entry = groups.entry(group).or_default();
        entry.average_length_of_stay = summarize(&samples, LosStatistic::Mean).value;
        entry.median_length_of_stay = summarize(&samples, LosStatistic::Median).value;
    }

    let days_in_window = f64::from(scope.window.days_in_window());
    for (group, split) in fold_window(records, scope, breakdown, &OverlapDays)?.categories {
        let days = split.combined(&OverlapDays) as f64;
        groups.entry(group).or_default().average_daily_population = days / days_in_window;
    }

    Ok(groups)
}

/// `year -> group -> metrics` for every year present on `axis`.
///
/// `axis` picks which years appear: entry years for admission-based
/// series, exit years for release-based ones. Each year is computed over
/// its own calendar-year window.
///
/// # Errors
///
/// * If the breakdown is not available for `detention_type`
/// * If a year present in the data cannot be represented as a window
pub fn analyze_by_year(
    records: &[StayRecord],
    detention_type: DetentionType,
    breakdown: &Breakdown,
    axis: DateAxis,
    program: Option<&str>,
) -> Result<YearSeries, AnalyticsError> {
    breakdown.ensure_supported(detention_type)?;

    let years = years_present(records, detention_type, axis, program);
    log::debug!(
        "Building {} series by {} over {} years",
        detention_type,
        breakdown.dimension(),
        years.len()
    );

    let mut series = YearSeries::new();
    for year in years {
        let scope = AggregationScope::calendar_year(year, detention_type)?.with_program(program);
        series.insert(year, year_metrics(records, &scope, breakdown)?);
    }

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{approx_eq, atd, secure, text};
    use detention_stats_analytics_models::BreakdownDimension;

    fn records() -> Vec<StayRecord> {
        let mut post = secure("2023-06-01", Some("2023-06-04"));
        post.post_dispo_stay_reason = text("Awaiting placement");
        post.gender = text("Female");

        let mut male = secure("2023-01-01", Some("2023-01-10"));
        male.gender = text("Male");

        let mut open = secure("2024-12-01", None);
        open.gender = text("Male");

        vec![male, post, open, secure("garbage", Some("2022-01-01"))]
    }

    #[test]
    fn years_follow_the_axis() {
        let records = vec![
            secure("2022-12-20", Some("2023-01-05")),
            secure("2024-03-01", None),
            secure("bad", Some("2021-05-05")),
        ];

        let secure_years =
            |axis| years_present(&records, DetentionType::SecureDetention, axis, None);

        let entry_years = secure_years(DateAxis::Entry);
        assert_eq!(entry_years.into_iter().collect::<Vec<_>>(), vec![2022, 2024]);

        let exit_years = secure_years(DateAxis::Exit);
        assert_eq!(exit_years.into_iter().collect::<Vec<_>>(), vec![2023]);
    }

    #[test]
    fn series_holds_every_metric_family() {
        let series = analyze_by_year(
            &records(),
            DetentionType::SecureDetention,
            &Breakdown::Overall,
            DateAxis::Entry,
            None,
        )
        .unwrap();

        assert_eq!(series.keys().copied().collect::<Vec<_>>(), vec![2023, 2024]);

        let all_2023 = series[&2023]["All"];
        assert_eq!(all_2023.admissions, 2);
        assert_eq!(all_2023.releases, 2);
        assert_eq!(all_2023.average_length_of_stay, Some(7.0));
        assert_eq!(all_2023.median_length_of_stay, Some(7.0));
        assert!(approx_eq(all_2023.average_daily_population, 14.0 / 365.0));

        let all_2024 = series[&2024]["All"];
        assert_eq!(all_2024.admissions, 1);
        assert_eq!(all_2024.releases, 0);
        assert_eq!(all_2024.average_length_of_stay, None);
        assert!(approx_eq(all_2024.average_daily_population, 31.0 / 366.0));
    }

    #[test]
    fn series_sliced_by_one_dimension() {
        let series = analyze_by_year(
            &records(),
            DetentionType::SecureDetention,
            &Breakdown::Gender,
            DateAxis::Entry,
            None,
        )
        .unwrap();

        let year = &series[&2023];
        assert_eq!(year["Male"].admissions, 1);
        assert_eq!(year["Female"].admissions, 1);
        assert_eq!(year["Female"].median_length_of_stay, Some(4.0));
        assert!(!series[&2024].contains_key("Female"));
    }

    #[test]
    fn dispo_series_is_zero_filled() {
        let series = analyze_by_year(
            &records(),
            DetentionType::SecureDetention,
            &Breakdown::DispoStatus,
            DateAxis::Entry,
            None,
        )
        .unwrap();

        let year = &series[&2024];
        assert_eq!(year["pre-dispo"].admissions, 1);
        assert_eq!(year["post-dispo"], YearMetrics::default());
    }

    #[test]
    fn success_failure_requires_atd() {
        let result = analyze_by_year(
            &records(),
            DetentionType::SecureDetention,
            &Breakdown::SuccessFailure,
            DateAxis::Exit,
            None,
        );
        assert!(matches!(
            result,
            Err(AnalyticsError::UnsupportedBreakdown {
                dimension: BreakdownDimension::SuccessFailure,
                ..
            })
        ));

        let mut done = atd("2024-01-01", Some("2024-02-01"));
        done.successful_exit = text("1");
        let series = analyze_by_year(
            &[done],
            DetentionType::AlternativeToDetention,
            &Breakdown::SuccessFailure,
            DateAxis::Exit,
            None,
        )
        .unwrap();
        assert_eq!(series[&2024]["Successful"].releases, 1);
        assert_eq!(series[&2024]["Unsuccessful"].releases, 0);
    }
}
