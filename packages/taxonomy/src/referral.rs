//! Referral-source and ATD exit-outcome grouping.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::non_blank;

/// Who referred the youth, collapsed to the four report buckets.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum ReferralGroup {
    #[serde(rename = "Law Enforcement")]
    #[strum(serialize = "Law Enforcement")]
    LawEnforcement,
    #[serde(rename = "Court")]
    #[strum(serialize = "Court")]
    Court,
    #[serde(rename = "School")]
    #[strum(serialize = "School")]
    School,
    #[serde(rename = "Other")]
    #[strum(serialize = "Other")]
    Other,
}

impl ReferralGroup {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::LawEnforcement, Self::Court, Self::School, Self::Other]
    }
}

/// Maps a free-text referral source by keyword. Blank text is
/// [`ReferralGroup::Other`].
#[must_use]
pub fn classify_referral_source(source: Option<&str>) -> ReferralGroup {
    let Some(source) = non_blank(source) else {
        return ReferralGroup::Other;
    };
    let lower = source.to_lowercase();

    if ["police", "sheriff", "law enforcement", "officer", "deputy"]
        .iter()
        .any(|k| lower.contains(k))
    {
        return ReferralGroup::LawEnforcement;
    }
    if ["court", "judge", "probation", "magistrate"]
        .iter()
        .any(|k| lower.contains(k))
    {
        return ReferralGroup::Court;
    }
    if lower.contains("school") {
        return ReferralGroup::School;
    }

    ReferralGroup::Other
}

/// Outcome of a completed ATD episode.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum ExitOutcome {
    #[serde(rename = "Successful")]
    #[strum(serialize = "Successful")]
    Successful,
    #[serde(rename = "Unsuccessful")]
    #[strum(serialize = "Unsuccessful")]
    Unsuccessful,
}

impl ExitOutcome {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Successful, Self::Unsuccessful]
    }

    /// Anything other than an explicit success flag counts as unsuccessful.
    #[must_use]
    pub const fn from_flag(successful: Option<bool>) -> Self {
        match successful {
            Some(true) => Self::Successful,
            Some(false) | None => Self::Unsuccessful,
        }
    }
}
