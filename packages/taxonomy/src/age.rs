//! Age-bracket schemes.
//!
//! Reports bucket ages with two different sets of thresholds (age at
//! intake vs. age at admission), so bracket boundaries are configuration
//! rather than code. Each scheme is a TOML document; the built-in ones
//! live in `schemes/` and are embedded at compile time. Callers always
//! name the scheme they mean.

use serde::{Deserialize, Serialize};

use crate::{TaxonomyError, UNKNOWN};

/// Identifier of the built-in age-at-intake scheme (`10 / 13 / 17`).
pub const INTAKE_SCHEME: &str = "intake";

/// Identifier of the built-in age-at-admission scheme (`13 / 15 / 18`).
pub const ADMISSION_SCHEME: &str = "admission";

/// Embedded TOML scheme definitions.
const SCHEME_TOMLS: &[(&str, &str)] = &[
    (INTAKE_SCHEME, include_str!("../schemes/intake.toml")),
    (ADMISSION_SCHEME, include_str!("../schemes/admission.toml")),
];

/// One bracket of a scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBracket {
    /// Label shown in reports (e.g. "14-17").
    pub label: String,
    /// Inclusive upper bound in whole years. `None` for the final,
    /// open-ended bracket.
    pub max_age: Option<u32>,
}

/// A named, ordered set of age brackets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeScheme {
    /// Unique scheme identifier (e.g. `"intake"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Brackets in ascending order; the last one is open-ended.
    pub brackets: Vec<AgeBracket>,
}

impl AgeScheme {
    /// Parses and validates a scheme from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`TaxonomyError::SchemeParse`] if the document is not valid
    /// TOML for this schema, or [`TaxonomyError::InvalidScheme`] if the
    /// brackets are empty, out of order, or not closed by exactly one
    /// open-ended bracket.
    pub fn from_toml(toml_str: &str) -> Result<Self, TaxonomyError> {
        let scheme: Self = toml::de::from_str(toml_str)?;
        scheme.validate()?;
        Ok(scheme)
    }

    fn validate(&self) -> Result<(), TaxonomyError> {
        let invalid = |message: &str| TaxonomyError::InvalidScheme {
            id: self.id.clone(),
            message: message.to_string(),
        };

        let Some((last, bounded)) = self.brackets.split_last() else {
            return Err(invalid("scheme has no brackets"));
        };

        if last.max_age.is_some() {
            return Err(invalid("last bracket must be open-ended"));
        }

        let mut previous: Option<u32> = None;
        for bracket in bounded {
            let Some(max_age) = bracket.max_age else {
                return Err(invalid(&format!(
                    "bracket '{}' is open-ended but is not last",
                    bracket.label
                )));
            };
            if previous.is_some_and(|p| max_age <= p) {
                return Err(invalid(&format!(
                    "bracket '{}' does not increase its upper bound",
                    bracket.label
                )));
            }
            previous = Some(max_age);
        }

        Ok(())
    }

    /// Returns the label of the bracket containing `age`, or [`UNKNOWN`]
    /// when the age could not be determined.
    #[must_use]
    pub fn classify(&self, age: Option<u32>) -> String {
        let Some(age) = age else {
            return UNKNOWN.to_string();
        };

        self.brackets
            .iter()
            .find(|bracket| bracket.max_age.is_none_or(|max| age <= max))
            .map_or_else(|| UNKNOWN.to_string(), |bracket| bracket.label.clone())
    }

    /// Every label this scheme can produce, in order, ending with
    /// [`UNKNOWN`].
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.brackets
            .iter()
            .map(|bracket| bracket.label.clone())
            .chain(std::iter::once(UNKNOWN.to_string()))
            .collect()
    }
}

/// Returns all built-in schemes.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse or validate. Since
/// these are compile-time constants, a failure indicates a development
/// error and is caught by the tests below.
#[must_use]
pub fn all_schemes() -> Vec<AgeScheme> {
    SCHEME_TOMLS
        .iter()
        .map(|(id, toml_str)| {
            AgeScheme::from_toml(toml_str)
                .unwrap_or_else(|e| panic!("Failed to load age scheme '{id}': {e}"))
        })
        .collect()
}

/// Looks up a built-in scheme by identifier.
///
/// # Errors
///
/// Returns [`TaxonomyError::UnknownScheme`] if no scheme has that id.
pub fn scheme(id: &str) -> Result<AgeScheme, TaxonomyError> {
    let found = all_schemes().into_iter().find(|scheme| scheme.id == id);
    if found.is_none() {
        log::warn!("Requested unknown age scheme '{id}'");
    }
    found.ok_or_else(|| TaxonomyError::UnknownScheme { id: id.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_schemes() {
        let schemes = all_schemes();
        assert_eq!(schemes.len(), SCHEME_TOMLS.len());
        for (scheme, (id, _)) in schemes.iter().zip(SCHEME_TOMLS) {
            assert_eq!(&scheme.id, id, "registry key must match the scheme id");
        }
    }

    #[test]
    fn scheme_ids_are_unique() {
        let mut seen = BTreeSet::new();
        for scheme in all_schemes() {
            assert!(seen.insert(scheme.id.clone()), "Duplicate scheme ID: {}", scheme.id);
        }
    }

    #[test]
    fn intake_scheme_boundaries() {
        let intake = scheme(INTAKE_SCHEME).unwrap();
        assert_eq!(intake.classify(Some(9)), "10 and younger");
        assert_eq!(intake.classify(Some(10)), "10 and younger");
        assert_eq!(intake.classify(Some(11)), "11-13");
        assert_eq!(intake.classify(Some(13)), "11-13");
        assert_eq!(intake.classify(Some(14)), "14-17");
        assert_eq!(intake.classify(Some(17)), "14-17");
        assert_eq!(intake.classify(Some(18)), "18+");
        assert_eq!(intake.classify(None), UNKNOWN);
    }

    #[test]
    fn admission_scheme_boundaries() {
        let admission = scheme(ADMISSION_SCHEME).unwrap();
        assert_eq!(admission.classify(Some(12)), "13 and under");
        assert_eq!(admission.classify(Some(13)), "13 and under");
        assert_eq!(admission.classify(Some(15)), "14 to 15");
        assert_eq!(admission.classify(Some(16)), "16 to 18");
        assert_eq!(admission.classify(Some(18)), "16 to 18");
        assert_eq!(admission.classify(Some(19)), "19 and up");
    }

    #[test]
    fn same_age_differs_between_schemes() {
        let intake = scheme(INTAKE_SCHEME).unwrap();
        let admission = scheme(ADMISSION_SCHEME).unwrap();
        assert_ne!(intake.classify(Some(18)), admission.classify(Some(18)));
    }

    #[test]
    fn labels_end_with_unknown() {
        let intake = scheme(INTAKE_SCHEME).unwrap();
        assert_eq!(
            intake.labels(),
            vec!["10 and younger", "11-13", "14-17", "18+", UNKNOWN]
        );
    }

    #[test]
    fn unknown_scheme_is_an_error() {
        assert!(matches!(
            scheme("nope"),
            Err(TaxonomyError::UnknownScheme { .. })
        ));
    }

    #[test]
    fn rejects_unordered_brackets() {
        let toml_str = r#"
            id = "bad"
            name = "Bad"
            [[brackets]]
            label = "young"
            max_age = 15
            [[brackets]]
            label = "younger"
            max_age = 12
            [[brackets]]
            label = "rest"
        "#;
        assert!(matches!(
            AgeScheme::from_toml(toml_str),
            Err(TaxonomyError::InvalidScheme { .. })
        ));
    }

    #[test]
    fn rejects_closed_last_bracket() {
        let toml_str = r#"
            id = "bad"
            name = "Bad"
            [[brackets]]
            label = "all"
            max_age = 30
        "#;
        assert!(matches!(
            AgeScheme::from_toml(toml_str),
            Err(TaxonomyError::InvalidScheme { .. })
        ));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            AgeScheme::from_toml("id = "),
            Err(TaxonomyError::SchemeParse(_))
        ));
    }
}
