//! Day-level interval accounting.
//!
//! Stays are inclusive on both ends: someone admitted and released on the
//! same day was present for one day.

use chrono::NaiveDate;

/// Number of days of the stay `[entry, exit]` that fall inside
/// `[window_start, window_end]`, counting both ends.
///
/// An open stay (`exit == None`) runs through the end of the window. A
/// stay without an entry date contributes nothing.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn overlap_days(
    entry: Option<NaiveDate>,
    exit: Option<NaiveDate>,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> u32 {
    let Some(entry) = entry else {
        return 0;
    };

    let clipped_start = entry.max(window_start);
    let clipped_end = exit.unwrap_or(window_end).min(window_end);

    if clipped_end < clipped_start {
        return 0;
    }

    ((clipped_end - clipped_start).num_days() + 1) as u32
}

/// Inclusive length of stay in days, `(exit - entry) + 1`.
///
/// `None` unless both dates are present. The value is not clamped: an
/// exit recorded before the entry yields zero or a negative number,
/// which callers treat as invalid.
#[must_use]
pub fn length_of_stay(entry: Option<NaiveDate>, exit: Option<NaiveDate>) -> Option<i64> {
    Some((exit? - entry?).num_days() + 1)
}
