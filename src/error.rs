#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("no file extension")]
    NoFileExtension,
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("report has {found} tables, table {index} requested")]
    MissingTable { index: usize, found: usize },
    #[error("table {0} has no header row")]
    MissingHeader(usize),
    #[error("row {row} has {found} cells, header has {expected}")]
    RowLengthMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("table has no unlabeled variable column")]
    MissingVariableColumn,
    #[error("duplicate column {0}")]
    DuplicateColumn(String),
    #[error("column {0} not found")]
    ColumnNotFound(String),
    #[error("invalid value {value:?} in column {column} at row {row}: {source}")]
    ParseFloat {
        column: String,
        row: usize,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },
    #[error("invalid fixed effects indicator {0:?}, expected Yes or No")]
    InvalidFixedEffects(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the report did not have the expected table structure.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Error::MissingTable { .. }
                | Error::MissingHeader(_)
                | Error::RowLengthMismatch { .. }
                | Error::MissingVariableColumn
                | Error::DuplicateColumn(_)
        )
    }

    /// Whether a statistic cell could not be read as a number.
    pub fn is_conversion_error(&self) -> bool {
        matches!(self, Error::ParseFloat { .. })
    }
}
