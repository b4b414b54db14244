//! Categorical slicing of stay records.

use detention_stats_analytics_models::BreakdownDimension;
use detention_stats_stay_models::{DetentionType, DispoStatus, StayRecord, parse_flag};
use detention_stats_taxonomy::{
    AgeScheme, DisruptionType, ExitOutcome, OffenseGroup, RaceGroup, ReferralGroup,
    SimplifiedOffense, UNKNOWN, classify_disruption, classify_dispo_status,
    classify_offense_category, classify_race_ethnicity, classify_race_simplified,
    classify_referral_source, classify_simplified_offense, or_unknown,
};

use crate::AnalyticsError;

/// Label of the single group produced by [`Breakdown::Overall`].
pub const ALL_GROUP: &str = "All";

/// Label of exits that carry no disruption flag.
pub const NO_DISRUPTION: &str = "No Disruption";

/// Maps a record to the category it is counted under.
///
/// Returning `None` leaves the record out of the fold entirely. Plain
/// closures of the same shape implement this trait.
pub trait Categorizer {
    /// Category of `record` when its dates are read for `detention_type`.
    fn categorize(&self, record: &StayRecord, detention_type: DetentionType) -> Option<String>;

    /// Categories reported even when nothing falls into them, in
    /// presentation order.
    fn known_categories(&self) -> Vec<String> {
        Vec::new()
    }

    /// Checks that the categories mean something for `detention_type`.
    ///
    /// # Errors
    ///
    /// * If the categories only exist for the other detention type
    fn ensure_supported(&self, _detention_type: DetentionType) -> Result<(), AnalyticsError> {
        Ok(())
    }
}

impl<F> Categorizer for F
where
    F: Fn(&StayRecord, DetentionType) -> Option<String>,
{
    fn categorize(&self, record: &StayRecord, detention_type: DetentionType) -> Option<String> {
        self(record, detention_type)
    }
}

/// One categorical dimension, ready to classify records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Breakdown {
    Overall,
    Gender,
    RaceEthnicity,
    RaceSimplified,
    /// Age at entry under the given scheme.
    AgeBracket(AgeScheme),
    OffenseCategory,
    DispoStatus,
    SuccessFailure,
    Facility,
    ReferralSource,
    ExitTo,
    ScreenedStatus,
    OffenseDetail,
    SimplifiedOffense,
    ReferralDetail,
    DisruptionType,
}

/// Disruption type of an ATD exit, from its exit flags.
#[must_use]
pub fn disruption_type(record: &StayRecord) -> Option<DisruptionType> {
    classify_disruption(|disruption| {
        let flag = match disruption {
            DisruptionType::Fta => &record.exit_fta,
            DisruptionType::NewOffense => &record.exit_new_offense,
            DisruptionType::Technical => &record.exit_technical,
            DisruptionType::Other => &record.exit_other,
        };
        parse_flag(flag.as_deref()) == Some(true)
    })
}

impl Breakdown {
    /// Builds a breakdown for `dimension`. `age_scheme` is only used by
    /// [`BreakdownDimension::AgeBracket`].
    ///
    /// # Errors
    ///
    /// * If the age-bracket dimension is requested without a scheme
    pub fn from_dimension(
        dimension: BreakdownDimension,
        age_scheme: Option<AgeScheme>,
    ) -> Result<Self, AnalyticsError> {
        Ok(match dimension {
            BreakdownDimension::Overall => Self::Overall,
            BreakdownDimension::Gender => Self::Gender,
            BreakdownDimension::RaceEthnicity => Self::RaceEthnicity,
            BreakdownDimension::RaceSimplified => Self::RaceSimplified,
            BreakdownDimension::AgeBracket => {
                Self::AgeBracket(age_scheme.ok_or(AnalyticsError::MissingAgeScheme)?)
            }
            BreakdownDimension::OffenseCategory => Self::OffenseCategory,
            BreakdownDimension::DispoStatus => Self::DispoStatus,
            BreakdownDimension::SuccessFailure => Self::SuccessFailure,
            BreakdownDimension::Facility => Self::Facility,
            BreakdownDimension::ReferralSource => Self::ReferralSource,
            BreakdownDimension::ExitTo => Self::ExitTo,
            BreakdownDimension::ScreenedStatus => Self::ScreenedStatus,
            BreakdownDimension::OffenseDetail => Self::OffenseDetail,
            BreakdownDimension::SimplifiedOffense => Self::SimplifiedOffense,
            BreakdownDimension::ReferralDetail => Self::ReferralDetail,
            BreakdownDimension::DisruptionType => Self::DisruptionType,
        })
    }

    /// The dimension this breakdown slices by.
    #[must_use]
    pub const fn dimension(&self) -> BreakdownDimension {
        match self {
            Self::Overall => BreakdownDimension::Overall,
            Self::Gender => BreakdownDimension::Gender,
            Self::RaceEthnicity => BreakdownDimension::RaceEthnicity,
            Self::RaceSimplified => BreakdownDimension::RaceSimplified,
            Self::AgeBracket(_) => BreakdownDimension::AgeBracket,
            Self::OffenseCategory => BreakdownDimension::OffenseCategory,
            Self::DispoStatus => BreakdownDimension::DispoStatus,
            Self::SuccessFailure => BreakdownDimension::SuccessFailure,
            Self::Facility => BreakdownDimension::Facility,
            Self::ReferralSource => BreakdownDimension::ReferralSource,
            Self::ExitTo => BreakdownDimension::ExitTo,
            Self::ScreenedStatus => BreakdownDimension::ScreenedStatus,
            Self::OffenseDetail => BreakdownDimension::OffenseDetail,
            Self::SimplifiedOffense => BreakdownDimension::SimplifiedOffense,
            Self::ReferralDetail => BreakdownDimension::ReferralDetail,
            Self::DisruptionType => BreakdownDimension::DisruptionType,
        }
    }

    /// Checks that the breakdown means something for `detention_type`.
    /// Exit outcomes and disruptions are only recorded for ATD.
    ///
    /// # Errors
    ///
    /// * If the dimension is ATD-only and `detention_type` is secure detention
    pub fn ensure_supported(&self, detention_type: DetentionType) -> Result<(), AnalyticsError> {
        if matches!(self, Self::SuccessFailure | Self::DisruptionType)
            && detention_type != DetentionType::AlternativeToDetention
        {
            return Err(AnalyticsError::UnsupportedBreakdown {
                dimension: self.dimension(),
                detention_type,
            });
        }
        Ok(())
    }

    /// Group label of `record`. Every record gets one.
    #[must_use]
    pub fn label(&self, record: &StayRecord, detention_type: DetentionType) -> String {
        match self {
            Self::Overall => ALL_GROUP.to_string(),
            Self::Gender => or_unknown(record.gender.as_deref()),
            Self::RaceEthnicity => {
                classify_race_ethnicity(record.race.as_deref(), record.ethnicity.as_deref())
            }
            Self::RaceSimplified => {
                classify_race_simplified(record.race.as_deref(), record.ethnicity.as_deref())
                    .to_string()
            }
            Self::AgeBracket(scheme) => scheme.classify(record.age_at_entry(detention_type)),
            Self::OffenseCategory => classify_offense_category(
                record.offense_category.as_deref(),
                record.post_dispo_stay_reason.as_deref(),
            )
            .to_string(),
            Self::DispoStatus => {
                classify_dispo_status(record.post_dispo_stay_reason.as_deref()).to_string()
            }
            Self::SuccessFailure => ExitOutcome::from_flag(record.successful_exit()).to_string(),
            Self::Facility => {
                let name = match detention_type {
                    DetentionType::SecureDetention => record.facility.as_deref(),
                    DetentionType::AlternativeToDetention => record
                        .program_name
                        .as_deref()
                        .or(record.facility.as_deref()),
                };
                or_unknown(name)
            }
            Self::ReferralSource => {
                classify_referral_source(record.referral_source.as_deref()).to_string()
            }
            Self::ExitTo => or_unknown(record.exit_to.as_deref()),
            Self::ScreenedStatus => or_unknown(record.screened.as_deref()),
            Self::OffenseDetail => or_unknown(record.offense_category.as_deref()),
            Self::SimplifiedOffense => {
                classify_simplified_offense(record.offense_category.as_deref()).to_string()
            }
            Self::ReferralDetail => or_unknown(record.referral_source.as_deref()),
            Self::DisruptionType => disruption_type(record)
                .map_or_else(|| NO_DISRUPTION.to_string(), |d| d.to_string()),
        }
    }
}

impl Categorizer for Breakdown {
    fn categorize(&self, record: &StayRecord, detention_type: DetentionType) -> Option<String> {
        Some(self.label(record, detention_type))
    }

    fn ensure_supported(&self, detention_type: DetentionType) -> Result<(), AnalyticsError> {
        Self::ensure_supported(self, detention_type)
    }

    fn known_categories(&self) -> Vec<String> {
        fn labels<T: ToString>(values: &[T]) -> Vec<String> {
            values.iter().map(ToString::to_string).collect()
        }

        match self {
            Self::Overall => vec![ALL_GROUP.to_string()],
            Self::RaceSimplified => labels(RaceGroup::all()),
            Self::AgeBracket(scheme) => scheme.labels(),
            Self::OffenseCategory => labels(OffenseGroup::all()),
            Self::DispoStatus => labels(DispoStatus::all()),
            Self::SuccessFailure => labels(ExitOutcome::all()),
            Self::ReferralSource => labels(ReferralGroup::all()),
            Self::SimplifiedOffense => labels(SimplifiedOffense::all()),
            Self::DisruptionType => {
                let mut known = labels(DisruptionType::all());
                known.push(NO_DISRUPTION.to_string());
                known
            }
            Self::Gender
            | Self::RaceEthnicity
            | Self::Facility
            | Self::ExitTo
            | Self::ScreenedStatus
            | Self::OffenseDetail
            | Self::ReferralDetail => Vec::new(),
        }
    }
}

/// Orders observed categories for presentation: `known` first in the
/// given order (zero-filled), then anything else alphabetically with
/// [`UNKNOWN`] last.
#[must_use]
pub fn presentation_order<'a>(
    known: Vec<String>,
    observed: impl IntoIterator<Item = &'a String>,
) -> Vec<String> {
    let mut extra: Vec<String> = observed
        .into_iter()
        .filter(|category| !known.contains(*category))
        .cloned()
        .collect();
    extra.sort_by(|a, b| (a == UNKNOWN, a).cmp(&(b == UNKNOWN, b)));
    extra.dedup();

    known.into_iter().chain(extra).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{atd, secure, text};
    use detention_stats_taxonomy::age::{INTAKE_SCHEME, scheme};

    #[test]
    fn overall_is_one_group() {
        let record = secure("2024-01-01", None);
        assert_eq!(
            Breakdown::Overall.label(&record, DetentionType::SecureDetention),
            ALL_GROUP
        );
    }

    #[test]
    fn age_bracket_needs_scheme() {
        assert!(matches!(
            Breakdown::from_dimension(BreakdownDimension::AgeBracket, None),
            Err(AnalyticsError::MissingAgeScheme)
        ));

        let intake = scheme(INTAKE_SCHEME).unwrap();
        let breakdown =
            Breakdown::from_dimension(BreakdownDimension::AgeBracket, Some(intake)).unwrap();
        assert_eq!(breakdown.dimension(), BreakdownDimension::AgeBracket);
    }

    #[test]
    fn dimension_round_trips() {
        let intake = scheme(INTAKE_SCHEME).unwrap();
        for &dimension in BreakdownDimension::all() {
            let breakdown = Breakdown::from_dimension(dimension, Some(intake.clone())).unwrap();
            assert_eq!(breakdown.dimension(), dimension);
        }
    }

    #[test]
    fn age_uses_entry_date_of_detention_type() {
        let intake = scheme(INTAKE_SCHEME).unwrap();
        let mut record = secure("2024-06-01", None);
        record.atd_entry_date = detention_stats_stay_models::DateField::parse("2027-06-01");
        record.date_of_birth = detention_stats_stay_models::DateField::parse("2010-06-02");

        let breakdown = Breakdown::AgeBracket(intake);
        assert_eq!(breakdown.label(&record, DetentionType::SecureDetention), "11-13");
        assert_eq!(
            breakdown.label(&record, DetentionType::AlternativeToDetention),
            "14-17"
        );
    }

    #[test]
    fn success_failure_is_atd_only() {
        assert!(matches!(
            Breakdown::SuccessFailure.ensure_supported(DetentionType::SecureDetention),
            Err(AnalyticsError::UnsupportedBreakdown { .. })
        ));
        assert!(
            Breakdown::SuccessFailure
                .ensure_supported(DetentionType::AlternativeToDetention)
                .is_ok()
        );
        assert!(Breakdown::Gender.ensure_supported(DetentionType::SecureDetention).is_ok());
    }

    #[test]
    fn disruption_type_is_atd_only() {
        assert!(matches!(
            Breakdown::DisruptionType.ensure_supported(DetentionType::SecureDetention),
            Err(AnalyticsError::UnsupportedBreakdown {
                dimension: BreakdownDimension::DisruptionType,
                ..
            })
        ));
        let as_categorizer: &dyn Categorizer = &Breakdown::SuccessFailure;
        assert!(as_categorizer.ensure_supported(DetentionType::SecureDetention).is_err());
        assert!(
            as_categorizer
                .ensure_supported(DetentionType::AlternativeToDetention)
                .is_ok()
        );
    }

    #[test]
    fn disruption_follows_flag_precedence() {
        let mut record = atd("2024-01-01", Some("2024-02-01"));
        let label = |r: &StayRecord| {
            Breakdown::DisruptionType.label(r, DetentionType::AlternativeToDetention)
        };
        assert_eq!(label(&record), NO_DISRUPTION);

        record.exit_other = text("1");
        assert_eq!(label(&record), "Other");
        record.exit_technical = text("1.0");
        assert_eq!(label(&record), "Technical");
        record.exit_fta = text("0");
        assert_eq!(label(&record), "Technical");
        record.exit_fta = text("1");
        assert_eq!(label(&record), "FTA");
    }

    #[test]
    fn detail_dimensions_use_raw_columns() {
        let mut record = secure("2024-01-01", None);
        record.offense_category = text("Felony Property");
        record.referral_source = text("City Police Dept");
        record.screened = text("Not Screened");

        let label = |breakdown: Breakdown| breakdown.label(&record, DetentionType::SecureDetention);
        assert_eq!(label(Breakdown::OffenseDetail), "Felony Property");
        assert_eq!(label(Breakdown::SimplifiedOffense), "Felonies");
        assert_eq!(label(Breakdown::ReferralDetail), "City Police Dept");
        assert_eq!(label(Breakdown::ReferralSource), "Law Enforcement");
        assert_eq!(label(Breakdown::ScreenedStatus), "Not Screened");
        assert_eq!(
            Breakdown::ScreenedStatus.label(
                &secure("2024-01-01", None),
                DetentionType::SecureDetention
            ),
            UNKNOWN
        );
    }

    #[test]
    fn facility_prefers_program_name_for_atd() {
        let mut record = atd("2024-01-01", None);
        record.facility = text("County Juvenile Center");
        record.program_name = text("Evening Reporting");

        assert_eq!(
            Breakdown::Facility.label(&record, DetentionType::AlternativeToDetention),
            "Evening Reporting"
        );
        assert_eq!(
            Breakdown::Facility.label(&record, DetentionType::SecureDetention),
            "County Juvenile Center"
        );
    }

    #[test]
    fn blank_values_are_unknown() {
        let mut record = secure("2024-01-01", None);
        record.gender = text("  ");
        assert_eq!(Breakdown::Gender.label(&record, DetentionType::SecureDetention), UNKNOWN);
        assert_eq!(Breakdown::ExitTo.label(&record, DetentionType::SecureDetention), UNKNOWN);
    }

    #[test]
    fn closures_are_categorizers() {
        let by_county = |record: &StayRecord, _: DetentionType| record.county_name.clone();
        let mut record = secure("2024-01-01", None);
        assert_eq!(by_county.categorize(&record, DetentionType::SecureDetention), None);
        record.county_name = text("Adams");
        assert_eq!(
            by_county.categorize(&record, DetentionType::SecureDetention),
            Some("Adams".to_string())
        );
        assert!(by_county.known_categories().is_empty());
    }

    #[test]
    fn presentation_order_puts_known_first_and_unknown_last() {
        let known = vec!["B".to_string(), "A".to_string()];
        let observed = [
            "Unknown".to_string(),
            "Z".to_string(),
            "A".to_string(),
            "C".to_string(),
        ];
        assert_eq!(
            presentation_order(known, observed.iter()),
            vec!["B", "A", "C", "Z", "Unknown"]
        );
    }
}
