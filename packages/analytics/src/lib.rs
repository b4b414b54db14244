#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Population-flow aggregation over stay records.
//!
//! Every aggregator is a pure fold over a borrowed slice of
//! [`StayRecord`]s for one [`AggregationScope`]. Records are never
//! modified; derived values (dispo status, category, overlap days) are
//! computed on the fly. All metric families share the single
//! classification path in [`fold`], so a record lands in the same
//! category and phase whichever metric is being computed.

pub mod breakdown;
pub mod fold;
pub mod interval;
pub mod outcomes;
pub mod overrides;
pub mod period;
pub mod population;
pub mod spatial;
pub mod statistics;
pub mod time_series;
pub mod window;

use chrono::NaiveDate;
use detention_stats_analytics_models::BreakdownDimension;
use detention_stats_stay_models::{DetentionType, StayRecord};
use detention_stats_taxonomy::TaxonomyError;
use thiserror::Error;

pub use breakdown::{Breakdown, Categorizer};
pub use window::ReportingWindow;

/// Errors that can occur when setting up an aggregation.
///
/// Folding itself never fails; these cover invalid parameters.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// The calendar year cannot be represented as a reporting window.
    #[error("Invalid reporting year: {year}")]
    InvalidYear {
        /// The requested year.
        year: i32,
    },

    /// A custom window ends before it starts.
    #[error("Invalid reporting window: {start} to {end}")]
    InvalidWindow {
        /// First day.
        start: NaiveDate,
        /// Last day.
        end: NaiveDate,
    },

    /// The breakdown has no meaning for the detention type.
    #[error("Breakdown '{dimension}' is not available for {detention_type}")]
    UnsupportedBreakdown {
        /// Requested dimension.
        dimension: BreakdownDimension,
        /// Detention type of the scope.
        detention_type: DetentionType,
    },

    /// The age-bracket breakdown was requested without a scheme.
    #[error("Breakdown 'age_bracket' requires an age scheme")]
    MissingAgeScheme,

    /// Taxonomy configuration failed to load.
    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),

    /// The ZIP coverage dataset could not be read.
    #[error("Coverage error: {message}")]
    Coverage {
        /// Description of what went wrong.
        message: String,
    },
}

/// Which records an aggregation looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationScope {
    /// Current reporting window.
    pub window: ReportingWindow,
    /// Selects the date-field pair used for every record.
    pub detention_type: DetentionType,
    /// Only records whose facility or program name matches.
    pub program: Option<String>,
}

impl AggregationScope {
    /// Creates an unfiltered scope.
    #[must_use]
    pub const fn new(window: ReportingWindow, detention_type: DetentionType) -> Self {
        Self {
            window,
            detention_type,
            program: None,
        }
    }

    /// Scope covering one calendar year.
    ///
    /// # Errors
    ///
    /// * If the year is out of range
    pub fn calendar_year(year: i32, detention_type: DetentionType) -> Result<Self, AnalyticsError> {
        Ok(Self::new(ReportingWindow::calendar_year(year)?, detention_type))
    }

    /// Restricts the scope to one facility or ATD program. Blank names
    /// clear the filter.
    #[must_use]
    pub fn with_program(mut self, program: Option<&str>) -> Self {
        self.program = program
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(ToString::to_string);
        self
    }

    /// The same scope over the preceding year, used for baselines.
    #[must_use]
    pub fn previous_period(&self) -> Self {
        Self {
            window: self.window.preceding_year(),
            detention_type: self.detention_type,
            program: self.program.clone(),
        }
    }

    /// Returns `true` if the record passes the program filter.
    #[must_use]
    pub fn includes(&self, record: &StayRecord) -> bool {
        self.program
            .as_deref()
            .is_none_or(|program| record.matches_program(program))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use period::admissions;
    use population::{average_daily_population, total_overlap_days};
    use statistics::{average_length_of_stay, median_length_of_stay};
    use test_support::{secure, text};

    #[test]
    fn program_filter_matches_facility_or_program() {
        let scope = AggregationScope::calendar_year(2024, DetentionType::SecureDetention)
            .unwrap()
            .with_program(Some(" North Hall "));

        let mut record = secure("2024-01-01", None);
        assert!(!scope.includes(&record));

        record.facility = text("north hall");
        assert!(scope.includes(&record));
    }

    #[test]
    fn blank_program_clears_filter() {
        let scope = AggregationScope::calendar_year(2024, DetentionType::SecureDetention)
            .unwrap()
            .with_program(Some("   "));
        assert_eq!(scope.program, None);
        assert!(scope.includes(&secure("2024-01-01", None)));
    }

    #[test]
    fn previous_period_keeps_filters() {
        let scope = AggregationScope::calendar_year(2024, DetentionType::AlternativeToDetention)
            .unwrap()
            .with_program(Some("Evening Reporting"));
        let previous = scope.previous_period();

        assert_eq!(previous.window.year(), 2023);
        assert_eq!(previous.detention_type, DetentionType::AlternativeToDetention);
        assert_eq!(previous.program.as_deref(), Some("Evening Reporting"));
    }

    fn scope(year: i32) -> AggregationScope {
        AggregationScope::calendar_year(year, DetentionType::SecureDetention).unwrap()
    }

    #[test]
    fn closed_felony_stay_end_to_end() {
        let mut record = secure("2024-01-01", Some("2024-01-10"));
        record.offense_category = text("Felony Person");
        let records = [record];

        let admissions = admissions(&records, &scope(2024), &Breakdown::OffenseCategory).unwrap();
        assert_eq!(admissions.category("New Offense").map(|b| b.pre), Some(1));

        let los = average_length_of_stay(&records, &scope(2024), &Breakdown::Overall).unwrap();
        assert_eq!(los.total, Some(10.0));

        let adp =
            average_daily_population(&records, &scope(2024), &Breakdown::OffenseCategory).unwrap();
        let contribution = adp.category("New Offense").map_or(0.0, |b| b.pre);
        assert!((contribution - 10.0 / 366.0).abs() < f64::EPSILON);
    }

    #[test]
    fn open_stay_end_to_end() {
        let mut record = secure("2024-01-01", None);
        record.offense_category = text("Felony Person");
        let records = [record];

        let los = median_length_of_stay(&records, &scope(2024), &Breakdown::Overall).unwrap();
        assert_eq!(los.total, None, "open stays have no length of stay");
        assert_eq!(los.overall.all.count, 0);

        assert_eq!(total_overlap_days(&records, &scope(2024)), 366);
        let adp = average_daily_population(&records, &scope(2024), &Breakdown::Overall).unwrap();
        assert!((adp.total - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn year_over_year_baselines_match_standalone_totals() {
        let mut post = secure("2023-08-01", Some("2024-02-15"));
        post.post_dispo_stay_reason = text("Awaiting placement");
        let records = vec![
            secure("2023-01-10", Some("2023-01-20")),
            secure("2023-05-05", Some("2023-05-05")),
            post,
            secure("2024-03-01", Some("2024-03-31")),
            secure("2024-11-01", None),
        ];
        let breakdown = Breakdown::OffenseCategory;

        let counts_2023 = admissions(&records, &scope(2023), &breakdown).unwrap();
        let counts_2024 = admissions(&records, &scope(2024), &breakdown).unwrap();
        assert_eq!(counts_2024.previous_period_baseline, counts_2023.total);

        let los_2023 = average_length_of_stay(&records, &scope(2023), &breakdown).unwrap();
        let los_2024 = average_length_of_stay(&records, &scope(2024), &breakdown).unwrap();
        assert_eq!(los_2024.previous_period_baseline, los_2023.total);

        let adp_2023 = average_daily_population(&records, &scope(2023), &breakdown).unwrap();
        let adp_2024 = average_daily_population(&records, &scope(2024), &breakdown).unwrap();
        assert!((adp_2024.previous_period_baseline - adp_2023.total).abs() < f64::EPSILON);
    }

    #[test]
    fn aggregation_leaves_records_untouched() {
        let mut record = secure("2024-01-01", Some("2024-01-10"));
        record.offense_category = text("Warrant");
        let records = vec![record];
        let snapshot = records.clone();

        admissions(&records, &scope(2024), &Breakdown::OffenseCategory).unwrap();
        median_length_of_stay(&records, &scope(2024), &Breakdown::Gender).unwrap();
        average_daily_population(&records, &scope(2024), &Breakdown::Overall).unwrap();

        assert_eq!(records, snapshot);
    }
}
