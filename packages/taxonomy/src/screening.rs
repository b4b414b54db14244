//! Detention screening overrides and ATD exit disruptions.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::non_blank;

/// Label every override reason mentioning "other" is folded into.
pub const OTHER_OVERRIDE_REASON: &str = "Other";

/// Why an ATD episode was disrupted.
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
pub enum DisruptionType {
    /// Failure to appear
    #[serde(rename = "FTA")]
    #[strum(serialize = "FTA")]
    Fta,
    #[serde(rename = "New Offense")]
    #[strum(serialize = "New Offense")]
    NewOffense,
    #[serde(rename = "Technical")]
    #[strum(serialize = "Technical")]
    Technical,
    #[serde(rename = "Other")]
    #[strum(serialize = "Other")]
    Other,
}

impl DisruptionType {
    /// Returns all variants of this enum in precedence order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Fta, Self::NewOffense, Self::Technical, Self::Other]
    }
}

/// The first disruption type, in [`DisruptionType::all`] order, whose
/// exit flag is set. An exit can carry several flags; it is counted once.
#[must_use]
pub fn classify_disruption(is_flagged: impl Fn(DisruptionType) -> bool) -> Option<DisruptionType> {
    DisruptionType::all()
        .iter()
        .copied()
        .find(|&disruption| is_flagged(disruption))
}

/// Normalizes an override reason. Reasons mentioning "other" collapse to
/// [`OTHER_OVERRIDE_REASON`]; blank reasons mean no override.
#[must_use]
pub fn classify_override_reason(reason: Option<&str>) -> Option<String> {
    let reason = non_blank(reason)?;
    if reason.to_lowercase().contains("other") {
        Some(OTHER_OVERRIDE_REASON.to_string())
    } else {
        Some(reason.to_string())
    }
}
