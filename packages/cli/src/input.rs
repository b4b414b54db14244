//! Loading normalized stay records from disk.
//!
//! Records arrive either as a JSON array of row objects or as a CSV file
//! with the canonical column headers. Both go through the same serde
//! mapping on [`StayRecord`].

use std::io::Read;
use std::path::Path;

use detention_stats_stay_models::StayRecord;

/// Reads records from `path`, choosing the format by extension
/// (`.csv` is CSV, anything else is JSON).
///
/// # Errors
///
/// * If the file cannot be read
/// * If its contents do not match the canonical row shape
pub fn load_records(path: &Path) -> Result<Vec<StayRecord>, Box<dyn std::error::Error>> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let records = if is_csv {
        parse_csv(std::fs::File::open(path)?)?
    } else {
        parse_json(&std::fs::read_to_string(path)?)?
    };

    log::info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Parses a JSON array of row objects.
///
/// # Errors
///
/// * If the text is not a JSON array of rows
pub fn parse_json(text: &str) -> Result<Vec<StayRecord>, serde_json::Error> {
    serde_json::from_str(text)
}

/// Parses CSV with a header row. Header names are trimmed; unknown
/// columns are ignored.
///
/// # Errors
///
/// * If a row cannot be read or deserialized
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<StayRecord>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    reader.deserialize().collect()
}
