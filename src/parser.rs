//! Delimited-text parser for survey exports.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::{Result, SurveyError};
use crate::survey::{SurveyRecord, SurveyTable, normalize_cell};

/// Reads a survey table with a header row from any reader.
///
/// Every row must have as many cells as the header. Cells are trimmed and missing
/// markers become `None`.
///
/// # Errors
///
/// Returns [`SurveyError::Csv`] on ragged rows or invalid UTF-8.
pub fn parse_survey<R: Read>(reader: R, delimiter: u8) -> Result<SurveyTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        records.push(SurveyRecord::new(row.iter().map(normalize_cell).collect()));
    }

    debug!(
        columns = headers.len(),
        rows = records.len(),
        "Survey table parsed"
    );
    Ok(SurveyTable::new(headers, records))
}

/// Loads a survey export from disk. Files ending in `.gz` are decompressed on the fly.
pub fn load_survey(path: &Path, delimiter: u8) -> Result<SurveyTable> {
    let file = File::open(path).map_err(|e| SurveyError::io(path, e))?;
    let gzipped = path.extension().and_then(|e| e.to_str()) == Some("gz");
    debug!(path = %path.display(), gzipped, "Opening survey file");

    if gzipped {
        parse_survey(GzDecoder::new(BufReader::new(file)), delimiter)
    } else {
        parse_survey(BufReader::new(file), delimiter)
    }
}
