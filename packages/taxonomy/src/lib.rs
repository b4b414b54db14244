#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical category buckets for stay records.
//!
//! Uploaded data carries free-text offense categories, race/ethnicity
//! columns, disposition reasons and birth dates. Every report slices by
//! the same canonical buckets, so all of the mapping rules live here and
//! nowhere else.

pub mod age;
pub mod offense;
pub mod race;
pub mod referral;
pub mod screening;

use detention_stats_stay_models::DispoStatus;
use thiserror::Error;

pub use age::{AgeBracket, AgeScheme};
pub use offense::{
    OffenseGroup, SimplifiedOffense, classify_offense_category, classify_simplified_offense,
};
pub use race::{RaceGroup, classify_race_ethnicity, classify_race_simplified};
pub use referral::{ExitOutcome, ReferralGroup, classify_referral_source};
pub use screening::{DisruptionType, classify_disruption, classify_override_reason};

/// Label used for any categorical value that is absent.
pub const UNKNOWN: &str = "Unknown";

/// Errors that can occur while loading taxonomy configuration.
#[derive(Debug, Error)]
pub enum TaxonomyError {
    /// An age-bracket scheme document could not be parsed.
    #[error("Failed to parse age scheme: {0}")]
    SchemeParse(#[from] toml::de::Error),

    /// An age-bracket scheme parsed but its brackets are inconsistent.
    #[error("Invalid age scheme '{id}': {message}")]
    InvalidScheme {
        /// Scheme identifier.
        id: String,
        /// Description of what went wrong.
        message: String,
    },

    /// No registered scheme has the requested identifier.
    #[error("Unknown age scheme '{id}'")]
    UnknownScheme {
        /// The identifier that was requested.
        id: String,
    },
}

/// Classifies a stay as pre- or post-disposition.
///
/// Depends only on the post-dispo stay reason: blank or absent means
/// pre-dispo, anything else means post-dispo.
#[must_use]
pub fn classify_dispo_status(post_dispo_reason: Option<&str>) -> DispoStatus {
    if non_blank(post_dispo_reason).is_some() {
        DispoStatus::PostDispo
    } else {
        DispoStatus::PreDispo
    }
}

/// Returns the trimmed text if it is non-empty.
#[must_use]
pub fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

/// Returns the trimmed text, or [`UNKNOWN`] when it is blank or absent.
#[must_use]
pub fn or_unknown(text: Option<&str>) -> String {
    non_blank(text).unwrap_or(UNKNOWN).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_reason_is_pre_dispo() {
        assert_eq!(classify_dispo_status(None), DispoStatus::PreDispo);
        assert_eq!(classify_dispo_status(Some("")), DispoStatus::PreDispo);
        assert_eq!(classify_dispo_status(Some("  ")), DispoStatus::PreDispo);
    }

    #[test]
    fn any_reason_is_post_dispo() {
        assert_eq!(
            classify_dispo_status(Some("Awaiting placement")),
            DispoStatus::PostDispo
        );
        assert_eq!(classify_dispo_status(Some("x")), DispoStatus::PostDispo);
    }

    #[test]
    fn or_unknown_fills_blanks() {
        assert_eq!(or_unknown(Some(" Male ")), "Male");
        assert_eq!(or_unknown(Some("")), UNKNOWN);
        assert_eq!(or_unknown(None), UNKNOWN);
    }
}
