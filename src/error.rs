use thiserror::Error;

/// Errors raised while turning export rows into database rows
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("malformed header: {reason}")]
    MalformedHeader { reason: String },

    #[error("line {line}: failed to read row: {source}")]
    Read {
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("line {line}: malformed row: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("line {line}: no {table} row for key {key:?}")]
    UnresolvedReference {
        line: u64,
        table: &'static str,
        key: Vec<String>,
    },

    #[error(
        "header does not match any statistics layout (missing columns: {})",
        missing.join(", ")
    )]
    UnsupportedLayout { missing: Vec<&'static str> },

    #[error("line {line}: database write failed: {source}")]
    Store {
        line: u64,
        #[source]
        source: rusqlite::Error,
    },
}

impl ImportError {
    pub fn malformed(line: u64, reason: impl Into<String>) -> Self {
        ImportError::MalformedRow {
            line,
            reason: reason.into(),
        }
    }

    /// Whether the row can be dropped while the rest of the file is imported
    pub fn is_row_local(&self) -> bool {
        matches!(self, ImportError::MalformedRow { .. })
    }
}

pub type ImportResult<T> = std::result::Result<T, ImportError>;
