//! Error type shared by the loader, the aggregators and the report builder.

use std::path::PathBuf;

/// Failures raised by the survey library.
///
/// `Schema` aborts a whole report. `EmptyInput` is recovered by the callers that
/// produce percentage tables and only escapes through the `try_` functions.
#[derive(Debug, thiserror::Error)]
pub enum SurveyError {
    /// A field the aggregation depends on is not present in the header row.
    #[error("required field `{field}` is missing from the survey table")]
    Schema { field: String },

    /// A percentage was requested over zero non-missing values.
    #[error("no non-missing values in field `{field}`")]
    EmptyInput { field: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed delimited input: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A row of the coordinate table could not be understood.
    #[error("invalid reference data at line {line}: {message}")]
    ReferenceData { line: u64, message: String },

    /// Overlap counting packs conditions into a 64-bit mask per respondent.
    #[error("{count} distinct conditions found, at most 64 are supported")]
    TooManyConditions { count: usize },
}

impl SurveyError {
    pub fn schema(field: impl Into<String>) -> Self {
        Self::Schema {
            field: field.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Alias for results carrying a [`SurveyError`].
pub type Result<T> = std::result::Result<T, SurveyError>;
