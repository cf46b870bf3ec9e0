//! Error and warning types for store operations

use crate::descriptor::TimestampError;
use thiserror::Error;

/// Error type for database operations
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A recording file lives in one file table at a time.
    #[error("{animal}/{file_name} is already in {table}")]
    AlreadyInOtherTable {
        animal: String,
        file_name: String,
        table: &'static str,
    },

    /// An event was added for a file that has no active recording row to
    /// take its file start from. Known gap: events are not linked to files
    /// by a foreign key, so this is only caught at insert time.
    #[error("No active recording file named '{file_name}'")]
    MissingRecordingFile { file_name: String },

    #[error("{table}: no row for '{key}'")]
    NotFound { table: &'static str, key: String },

    #[error("{table}: expected one row for '{key}', found {count}")]
    NotUnique {
        table: &'static str,
        key: String,
        count: usize,
    },
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Non-fatal outcome reported alongside a successful write.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreWarning {
    /// The file start could not be built from the channel data, so the
    /// column was left empty.
    FileStartUnset {
        animal: String,
        file_name: String,
        reason: TimestampError,
    },
}

impl std::fmt::Display for StoreWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreWarning::FileStartUnset {
                animal,
                file_name,
                reason,
            } => write!(f, "file start left unset for {}/{}: {}", animal, file_name, reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_errors_convert() {
        let err: DbError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, DbError::Io(_)));
        assert_eq!(err.to_string(), "IO error: gone");
    }

    #[test]
    fn test_other_table_message() {
        let err = DbError::AlreadyInOtherTable {
            animal: "ratA".into(),
            file_name: "f1.dat".into(),
            table: "DataFiles",
        };
        assert_eq!(err.to_string(), "ratA/f1.dat is already in DataFiles");
    }
}
