//! Offense category mapping.
//!
//! Maps the free-text `OffenseCategory` column, together with the
//! post-dispo stay reason, to the canonical [`OffenseGroup`] used for the
//! "reason for detention" breakdown. Matching is keyword-based and
//! case-insensitive.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::non_blank;

/// Canonical reason-for-detention bucket.
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
pub enum OffenseGroup {
    /// Felonies, misdemeanors and status offenses
    #[serde(rename = "New Offense")]
    #[strum(serialize = "New Offense")]
    NewOffense,
    /// Warrants, court orders, probation violations and anything unmatched
    #[serde(rename = "Technical")]
    #[strum(serialize = "Technical")]
    Technical,
    /// Post-dispo youth held while a placement is arranged
    #[serde(rename = "Awaiting Placement")]
    #[strum(serialize = "Awaiting Placement")]
    AwaitingPlacement,
    /// Post-dispo sentence served in secure detention
    #[serde(rename = "Confinement to Secure Detention")]
    #[strum(serialize = "Confinement to Secure Detention")]
    ConfinementToSecureDetention,
    /// Post-dispo stays with an "other" reason
    #[serde(rename = "Other")]
    #[strum(serialize = "Other")]
    Other,
}

impl OffenseGroup {
    /// Returns all variants of this enum in presentation order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::NewOffense,
            Self::Technical,
            Self::AwaitingPlacement,
            Self::ConfinementToSecureDetention,
            Self::Other,
        ]
    }
}

/// Maps an offense category and post-dispo reason to an [`OffenseGroup`].
///
/// A non-blank post-dispo reason is inspected first ("awaiting",
/// "confinement", "other"). If it matches none of those, the offense text
/// decides: "felony"/"misdemeanor" anywhere, or exactly "Status Offense",
/// is a new offense. Everything else, including blank offense text, is
/// [`OffenseGroup::Technical`].
#[must_use]
pub fn classify_offense_category(
    offense_category: Option<&str>,
    post_dispo_reason: Option<&str>,
) -> OffenseGroup {
    if let Some(reason) = non_blank(post_dispo_reason) {
        let reason = reason.to_lowercase();
        if reason.contains("awaiting") {
            return OffenseGroup::AwaitingPlacement;
        }
        if reason.contains("confinement") {
            return OffenseGroup::ConfinementToSecureDetention;
        }
        if reason.contains("other") {
            return OffenseGroup::Other;
        }
    }

    let Some(offense) = non_blank(offense_category) else {
        return OffenseGroup::Technical;
    };
    let lower = offense.to_lowercase();

    if contains_any(&lower, &["felony", "misdemeanor"]) || lower == "status offense" {
        return OffenseGroup::NewOffense;
    }

    OffenseGroup::Technical
}

/// Four-way offense grouping used by the detail charts.
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
pub enum SimplifiedOffense {
    #[serde(rename = "Felonies")]
    #[strum(serialize = "Felonies")]
    Felonies,
    #[serde(rename = "Misdemeanors")]
    #[strum(serialize = "Misdemeanors")]
    Misdemeanors,
    #[serde(rename = "Technicals")]
    #[strum(serialize = "Technicals")]
    Technicals,
    #[serde(rename = "Other")]
    #[strum(serialize = "Other")]
    Other,
}

impl SimplifiedOffense {
    /// Returns all variants of this enum in presentation order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Felonies, Self::Misdemeanors, Self::Technicals, Self::Other]
    }
}

/// Offense categories that count as technical violations. Matched exactly.
const TECHNICAL_OFFENSES: &[&str] = &[
    "Court Order",
    "Warrant",
    "Status Offense",
    "Probation Violation",
    "ATD Program Failure",
    "Other Technical Violation",
    "Contempt of Court",
];

/// Maps an offense category to a [`SimplifiedOffense`].
///
/// "felony" or "misdemeanor" anywhere in the text wins; otherwise the
/// text must equal one of the technical-violation categories. Blank or
/// unmatched text is [`SimplifiedOffense::Other`].
#[must_use]
pub fn classify_simplified_offense(offense_category: Option<&str>) -> SimplifiedOffense {
    let Some(offense) = non_blank(offense_category) else {
        return SimplifiedOffense::Other;
    };
    let lower = offense.to_lowercase();

    if lower.contains("felony") {
        SimplifiedOffense::Felonies
    } else if lower.contains("misdemeanor") {
        SimplifiedOffense::Misdemeanors
    } else if TECHNICAL_OFFENSES.contains(&offense) {
        SimplifiedOffense::Technicals
    } else {
        SimplifiedOffense::Other
    }
}

/// Checks if `haystack` contains any of the given `needles`.
fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}
