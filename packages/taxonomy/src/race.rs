//! Race and ethnicity grouping.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::{UNKNOWN, non_blank};

/// Two-way race grouping used by the disparity charts.
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
pub enum RaceGroup {
    #[serde(rename = "White")]
    #[strum(serialize = "White")]
    White,
    #[serde(rename = "Youth of Color")]
    #[strum(serialize = "Youth of Color")]
    YouthOfColor,
}

impl RaceGroup {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::White, Self::YouthOfColor]
    }
}

fn is_hispanic(ethnicity: Option<&str>) -> bool {
    non_blank(ethnicity).is_some_and(|e| e.eq_ignore_ascii_case("hispanic"))
}

/// Combined race/ethnicity label.
///
/// Hispanic ethnicity overrides race; otherwise the race column is used
/// as-is, or [`UNKNOWN`] when blank.
#[must_use]
pub fn classify_race_ethnicity(race: Option<&str>, ethnicity: Option<&str>) -> String {
    if is_hispanic(ethnicity) {
        return "Hispanic".to_string();
    }
    non_blank(race).unwrap_or(UNKNOWN).to_string()
}

/// White only when race is White and ethnicity is not Hispanic.
#[must_use]
pub fn classify_race_simplified(race: Option<&str>, ethnicity: Option<&str>) -> RaceGroup {
    let white = non_blank(race).is_some_and(|r| r.eq_ignore_ascii_case("white"));
    if white && !is_hispanic(ethnicity) {
        RaceGroup::White
    } else {
        RaceGroup::YouthOfColor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hispanic_overrides_race() {
        assert_eq!(classify_race_ethnicity(Some("White"), Some("Hispanic")), "Hispanic");
        assert_eq!(classify_race_ethnicity(Some("Black"), Some("hispanic")), "Hispanic");
    }

    #[test]
    fn race_passes_through() {
        assert_eq!(
            classify_race_ethnicity(Some("Asian"), Some("Non-Hispanic")),
            "Asian"
        );
        assert_eq!(classify_race_ethnicity(None, None), UNKNOWN);
        assert_eq!(classify_race_ethnicity(Some(" "), None), UNKNOWN);
    }

    #[test]
    fn simplified_race() {
        assert_eq!(classify_race_simplified(Some("White"), None), RaceGroup::White);
        assert_eq!(
            classify_race_simplified(Some("White"), Some("Non-Hispanic")),
            RaceGroup::White
        );
        assert_eq!(
            classify_race_simplified(Some("White"), Some("Hispanic")),
            RaceGroup::YouthOfColor
        );
        assert_eq!(
            classify_race_simplified(Some("Black"), None),
            RaceGroup::YouthOfColor
        );
        assert_eq!(classify_race_simplified(None, None), RaceGroup::YouthOfColor);
    }

    #[test]
    fn labels() {
        assert_eq!(RaceGroup::YouthOfColor.to_string(), "Youth of Color");
    }
}
