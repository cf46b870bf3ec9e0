//! eegdb - Metadata store for EEG recordings and seizure events
//!
//! eegdb records what an electrophysiology analysis pipeline knows about its
//! data: which recording files exist for which animal, which events
//! (seizures and other annotated occurrences) were found in them, the
//! detection parameters tuned for each animal, and how raw acquisition
//! channels map onto logical animals.
//!
//! # Tables
//!
//! | Table | Key | Holds |
//! |-------|-----|-------|
//! | `DataFiles` | animal, file_name | Recording files in the active analysis set |
//! | `unusedDataFiles` | animal, file_name | Ingested files not yet triaged |
//! | `Events` | animal, filename, event_start | Detected or annotated events |
//! | `AlgorithmParameters` | animal | Detection parameters, one row per animal |
//! | `AnimalChannelList` | id | Channel label to compound animal |
//!
//! A file lives in exactly one of the two file tables at a time; moving it
//! between them is a single transaction.
//!
//! # Quick Start
//!
//! ```no_run
//! use eegdb::{ChannelData, Database, FileTable, NewRecord, RecordSelector};
//! use std::path::PathBuf;
//!
//! let db = Database::open_at("eeg.db")?;
//! let channel = ChannelData {
//!     name: "ratA".into(),
//!     idx: 0,
//!     file_length: 3_600_000,
//!     number: 4,
//!     sample_freq: 1000,
//!     file_start: Some(vec![2019, 6, 1, 8, 30, 0]),
//! };
//! db.add_record(&NewRecord::DataFile {
//!     table: FileTable::Unreviewed,
//!     path: PathBuf::from("/data/rat_a_0601.smr"),
//!     channel,
//! })?;
//!
//! // Accept every file of ratA into the analysis set
//! db.move_recording_files(FileTable::Unreviewed, "ratA")?;
//! assert!(db.record_exists(&RecordSelector::file_name(FileTable::Active, "rat_a_0601.smr"))?);
//! # Ok::<(), eegdb::DbError>(())
//! ```
//!
//! # Modules
//!
//! - [`db`]: The [`Database`] handle, one pooled connection per call
//! - [`ops`]: The same operations on a caller-owned connection
//! - [`record`]: Selectors and payloads for each entity
//! - [`descriptor`]: Channel and event descriptors from acquisition/detection code

pub mod config;
pub mod db;
pub mod descriptor;
pub mod error;
pub mod models;
pub mod ops;
pub mod record;
pub mod schema;

pub use config::StoreConfig;
pub use db::Database;
pub use descriptor::{ChannelData, EventDescriptor};
pub use error::{DbError, Result, StoreWarning};
pub use models::{
    AnalysisParameters, ChannelMapping, Event, RecordingFile, UnreviewedRecordingFile,
};
pub use record::{
    EditStatus, EventKey, FileTable, HowFound, NewRecord, RecordSelector, RecordingFileUpdate,
    ReviewMark, Table,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        assert_eq!(FileTable::Active.other(), FileTable::Unreviewed);
        assert_eq!(Table::Events.table_name(), "Events");
        assert_eq!("auto".parse::<HowFound>().unwrap(), HowFound::Automatic);
        assert_eq!(StoreConfig::default().pool_size, config::DEFAULT_POOL_SIZE);
    }

    #[test]
    fn test_defaults_accessible() {
        let params = AnalysisParameters::with_defaults("ratA");
        assert_eq!(params.window_size, 500);
    }
}
