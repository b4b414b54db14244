#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Normalized stay records for youth-detention statistics.
//!
//! A [`StayRecord`] is one person's episode in secure detention or in an
//! alternative-to-detention (ATD) program, as produced by the upload and
//! validation step. Records are immutable inputs: aggregation code only
//! ever reads them and derives new values.
//!
//! Dates are carried as a [`DateField`] so that "missing" and
//! "present but unparseable" stay distinguishable all the way into the
//! aggregation layer.

use chrono::{Datelike as _, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Which program a stay belongs to. Selects the entry/exit column pair.
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
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DetentionType {
    /// Secure detention (`Admission_Date` / `Release_Date`).
    SecureDetention,
    /// Alternative-to-detention supervision (`ATD_Entry_Date` / `ATD_Exit_Date`).
    AlternativeToDetention,
}

impl DetentionType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::SecureDetention, Self::AlternativeToDetention]
    }
}

/// Court phase of a stay.
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
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DispoStatus {
    /// Awaiting court disposition.
    PreDispo,
    /// Held after disposition (a post-dispo stay reason is recorded).
    PostDispo,
}

impl DispoStatus {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::PreDispo, Self::PostDispo]
    }
}

/// Result of parsing one date column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum DateField {
    /// Column absent or blank.
    #[default]
    Missing,
    /// A calendar date.
    Valid(NaiveDate),
    /// Column present but not an ISO-8601 date. Holds the raw text.
    Unparseable(String),
}

impl DateField {
    /// Parses an ISO-8601 date (`YYYY-MM-DD`).
    ///
    /// A trailing time component (`THH:MM:SS`, optional fraction and `Z`)
    /// is accepted and dropped. Blank input is [`DateField::Missing`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Missing;
        }

        let date_part = trimmed.split_once('T').map_or(trimmed, |(date, _)| date);

        NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .map_or_else(|_| Self::Unparseable(trimmed.to_string()), Self::Valid)
    }

    /// Returns the date if this field parsed successfully.
    #[must_use]
    pub const fn valid(&self) -> Option<NaiveDate> {
        match self {
            Self::Valid(date) => Some(*date),
            Self::Missing | Self::Unparseable(_) => None,
        }
    }

    /// Returns `true` if the column held text that is not a date.
    #[must_use]
    pub const fn is_unparseable(&self) -> bool {
        matches!(self, Self::Unparseable(_))
    }
}

impl From<Option<String>> for DateField {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Missing, |raw| Self::parse(&raw))
    }
}

impl From<NaiveDate> for DateField {
    fn from(value: NaiveDate) -> Self {
        Self::Valid(value)
    }
}

impl Serialize for DateField {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Missing => serializer.serialize_none(),
            Self::Valid(date) => serializer.serialize_str(&date.format("%Y-%m-%d").to_string()),
            Self::Unparseable(raw) => serializer.serialize_str(raw),
        }
    }
}

impl<'de> Deserialize<'de> for DateField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient_text(deserializer).map(Self::from)
    }
}

/// Entry/exit dates of one stay for a chosen [`DetentionType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayDates {
    /// Start of the stay, if it parsed.
    pub entry: Option<NaiveDate>,
    /// End of the stay, if it parsed. `None` with a present entry means
    /// the stay is still open.
    pub exit: Option<NaiveDate>,
    /// One of the two columns held unparseable text.
    pub unparseable: bool,
}

/// One person's detention or ATD episode.
///
/// Field names follow the canonical upload columns. All text columns
/// accept strings or numbers (spreadsheets often export ZIP codes and
/// flags as numbers); blank text is treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StayRecord {
    /// Secure-detention admission date.
    #[serde(rename = "Admission_Date", default)]
    pub admission_date: DateField,
    /// Secure-detention release date.
    #[serde(rename = "Release_Date", default)]
    pub release_date: DateField,
    /// ATD program entry date.
    #[serde(rename = "ATD_Entry_Date", default)]
    pub atd_entry_date: DateField,
    /// ATD program exit date.
    #[serde(rename = "ATD_Exit_Date", default)]
    pub atd_exit_date: DateField,
    #[serde(rename = "Gender", default, deserialize_with = "lenient_text")]
    pub gender: Option<String>,
    #[serde(rename = "Race", default, deserialize_with = "lenient_text")]
    pub race: Option<String>,
    #[serde(rename = "Ethnicity", default, deserialize_with = "lenient_text")]
    pub ethnicity: Option<String>,
    #[serde(rename = "Date_of_Birth", default)]
    pub date_of_birth: DateField,
    /// Free-text offense category (e.g. "Felony Person", "Warrant").
    #[serde(rename = "OffenseCategory", default, deserialize_with = "lenient_text")]
    pub offense_category: Option<String>,
    /// Present only for post-disposition stays.
    #[serde(
        rename = "Post-Dispo Stay Reason",
        default,
        deserialize_with = "lenient_text"
    )]
    pub post_dispo_stay_reason: Option<String>,
    #[serde(rename = "Facility", default, deserialize_with = "lenient_text")]
    pub facility: Option<String>,
    #[serde(rename = "ATD_Program_Name", default, deserialize_with = "lenient_text")]
    pub program_name: Option<String>,
    /// Numeric cells are zero-padded back to five (or nine) digits.
    #[serde(rename = "Home_Zip_Code", default, deserialize_with = "zip_code")]
    pub home_zip_code: Option<String>,
    #[serde(rename = "CountyName", default, deserialize_with = "lenient_text")]
    pub county_name: Option<String>,
    #[serde(rename = "Referral_Source", default, deserialize_with = "lenient_text")]
    pub referral_source: Option<String>,
    /// ATD exit outcome flag (`1` = successful).
    #[serde(
        rename = "ATD_Successful_Exit",
        default,
        deserialize_with = "lenient_text"
    )]
    pub successful_exit: Option<String>,
    #[serde(rename = "Exit_To", default, deserialize_with = "lenient_text")]
    pub exit_to: Option<String>,
    /// Whether a detention screening was done ("Screened", "Not Screened").
    #[serde(
        rename = "Screened/not screened",
        default,
        deserialize_with = "lenient_text"
    )]
    pub screened: Option<String>,
    /// Date of the detention screening.
    #[serde(rename = "Intake_Date", default)]
    pub intake_date: DateField,
    /// Detention screening tool score.
    #[serde(rename = "DST_Score", default, deserialize_with = "lenient_text")]
    pub dst_score: Option<String>,
    /// Why the screening recommendation was overridden, if it was.
    #[serde(rename = "Override_Reason", default, deserialize_with = "lenient_text")]
    pub override_reason: Option<String>,
    /// ATD exit disruption flags (`1` = set).
    #[serde(rename = "ATD_Exit_FTA", default, deserialize_with = "lenient_text")]
    pub exit_fta: Option<String>,
    #[serde(
        rename = "ATD_Exit_New_Offense",
        default,
        deserialize_with = "lenient_text"
    )]
    pub exit_new_offense: Option<String>,
    #[serde(
        rename = "ATD_Exit_Technical",
        default,
        deserialize_with = "lenient_text"
    )]
    pub exit_technical: Option<String>,
    #[serde(rename = "ATD_Exit_Other", default, deserialize_with = "lenient_text")]
    pub exit_other: Option<String>,
}

impl StayRecord {
    /// Returns the entry/exit pair for the given program type.
    #[must_use]
    pub fn stay_dates(&self, detention_type: DetentionType) -> StayDates {
        let (entry, exit) = match detention_type {
            DetentionType::SecureDetention => (&self.admission_date, &self.release_date),
            DetentionType::AlternativeToDetention => (&self.atd_entry_date, &self.atd_exit_date),
        };

        StayDates {
            entry: entry.valid(),
            exit: exit.valid(),
            unparseable: entry.is_unparseable() || exit.is_unparseable(),
        }
    }

    /// Entry date for the given program type, if valid.
    #[must_use]
    pub fn entry_date(&self, detention_type: DetentionType) -> Option<NaiveDate> {
        self.stay_dates(detention_type).entry
    }

    /// Exit date for the given program type, if valid.
    #[must_use]
    pub fn exit_date(&self, detention_type: DetentionType) -> Option<NaiveDate> {
        self.stay_dates(detention_type).exit
    }

    /// Age in whole years on the entry date of the given program type.
    #[must_use]
    pub fn age_at_entry(&self, detention_type: DetentionType) -> Option<u32> {
        let birth = self.date_of_birth.valid()?;
        let entry = self.entry_date(detention_type)?;
        whole_years_between(birth, entry)
    }

    /// Returns `true` if `Facility` or `ATD_Program_Name` equals `program`
    /// (trimmed, case-insensitive).
    #[must_use]
    pub fn matches_program(&self, program: &str) -> bool {
        let wanted = program.trim();
        [self.facility.as_deref(), self.program_name.as_deref()]
            .into_iter()
            .flatten()
            .any(|name| name.trim().eq_ignore_ascii_case(wanted))
    }

    /// Interprets the ATD exit flag. `None` when absent or unrecognized.
    #[must_use]
    pub fn successful_exit(&self) -> Option<bool> {
        parse_flag(self.successful_exit.as_deref())
    }

    /// Date the screening happened: `Intake_Date`, or the entry date of
    /// `detention_type` when no intake date was recorded.
    #[must_use]
    pub fn screening_date(&self, detention_type: DetentionType) -> Option<NaiveDate> {
        self.intake_date
            .valid()
            .or_else(|| self.entry_date(detention_type))
    }

    /// Returns `true` if a screening score was recorded.
    #[must_use]
    pub fn has_screening_score(&self) -> bool {
        self.dst_score.as_deref().is_some_and(|score| !score.trim().is_empty())
    }

    /// Home ZIP code with whitespace and any ZIP+4 suffix removed.
    #[must_use]
    pub fn home_zip(&self) -> Option<&str> {
        self.home_zip_code.as_deref().and_then(normalize_zip)
    }
}

/// Interprets a yes/no flag cell. `None` when absent or unrecognized.
#[must_use]
pub fn parse_flag(raw: Option<&str>) -> Option<bool> {
    let flag = raw?.trim().to_lowercase();
    match flag.as_str() {
        "1" | "1.0" | "true" | "yes" | "y" => Some(true),
        "0" | "0.0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Trims a ZIP code and drops a ZIP+4 suffix, dashed or not. Blank input
/// is `None`.
#[must_use]
pub fn normalize_zip(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let base = trimmed.split_once('-').map_or(trimmed, |(zip, _)| zip).trim();
    if base.is_empty() {
        return None;
    }
    if base.len() == 9 && base.bytes().all(|b| b.is_ascii_digit()) {
        return Some(&base[..5]);
    }
    Some(base)
}

/// Restores the leading zeros of a ZIP code that went through a number
/// (`2134` becomes `02134`). Up to five digits pad to a ZIP, six to nine
/// digits pad to a ZIP+4. Anything else is `None`.
#[must_use]
pub fn pad_numeric_zip(digits: &str) -> Option<String> {
    if digits.is_empty() || digits.len() > 9 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let width = if digits.len() <= 5 { 5 } else { 9 };
    Some(format!("{digits:0>width$}"))
}

/// Whole years elapsed from `birth` to `on`, counting a year only once the
/// birthday has been reached. `None` if `on` precedes `birth`.
#[must_use]
pub fn whole_years_between(birth: NaiveDate, on: NaiveDate) -> Option<u32> {
    if on < birth {
        return None;
    }

    let mut years = on.year() - birth.year();
    if (on.month(), on.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }

    u32::try_from(years).ok()
}

/// One spreadsheet cell. CSV readers hand numeric-looking text over as a
/// number, so every text column has to accept all of these.
#[derive(Deserialize)]
#[serde(untagged)]
enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() { None } else { Some(text) }
}

/// Accepts a string, number or boolean cell and yields its text form.
/// Blank strings become `None`.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let cell = Option::<Cell>::deserialize(deserializer)?;
    Ok(cell.and_then(|cell| {
        non_empty(match cell {
            Cell::Text(text) => text,
            Cell::Int(value) => value.to_string(),
            Cell::Float(value) => value.to_string(),
            Cell::Bool(value) => value.to_string(),
        })
    }))
}

/// Like [`lenient_text`], but numeric cells are read as ZIP codes whose
/// leading zeros were lost. Non-integral numbers and booleans are dropped.
fn zip_code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let cell = Option::<Cell>::deserialize(deserializer)?;
    Ok(cell.and_then(|cell| match cell {
        Cell::Text(text) => non_empty(text),
        Cell::Int(value) => pad_numeric_zip(&value.to_string()),
        Cell::Float(value) if value.is_finite() && value.fract() == 0.0 => {
            pad_numeric_zip(&format!("{value}"))
        }
        Cell::Float(_) | Cell::Bool(_) => None,
    }))
}
