//! Typed selectors and payloads for store operations
//!
//! Each operation that used to branch on "whichever optional argument was
//! set" takes one of these sum types instead, so the target table is never
//! ambiguous.

use crate::descriptor::{base_name, ChannelData, EventDescriptor};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The two lifecycle states a recording file can be stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileTable {
    /// Accepted into the active analysis set (`DataFiles`)
    Active,
    /// Ingested but not yet triaged (`unusedDataFiles`)
    Unreviewed,
}

impl FileTable {
    pub fn table_name(self) -> &'static str {
        match self {
            FileTable::Active => "DataFiles",
            FileTable::Unreviewed => "unusedDataFiles",
        }
    }

    /// The table a file moves to when its status flips.
    pub fn other(self) -> Self {
        match self {
            FileTable::Active => FileTable::Unreviewed,
            FileTable::Unreviewed => FileTable::Active,
        }
    }
}

impl std::fmt::Display for FileTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for FileTable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DataFiles" | "active" => Ok(FileTable::Active),
            "unusedDataFiles" | "unused" | "unreviewed" => Ok(FileTable::Unreviewed),
            other => Err(format!("unknown file table '{}'", other)),
        }
    }
}

/// Every table in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    AnimalChannelList,
    DataFiles,
    UnusedDataFiles,
    AlgorithmParameters,
    Events,
}

impl Table {
    pub fn table_name(self) -> &'static str {
        match self {
            Table::AnimalChannelList => "AnimalChannelList",
            Table::DataFiles => "DataFiles",
            Table::UnusedDataFiles => "unusedDataFiles",
            Table::AlgorithmParameters => "AlgorithmParameters",
            Table::Events => "Events",
        }
    }
}

impl From<FileTable> for Table {
    fn from(table: FileTable) -> Self {
        match table {
            FileTable::Active => Table::DataFiles,
            FileTable::Unreviewed => Table::UnusedDataFiles,
        }
    }
}

impl FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AnimalChannelList" => Ok(Table::AnimalChannelList),
            "DataFiles" => Ok(Table::DataFiles),
            "unusedDataFiles" => Ok(Table::UnusedDataFiles),
            "AlgorithmParameters" => Ok(Table::AlgorithmParameters),
            "Events" => Ok(Table::Events),
            other => Err(format!("unknown table '{}'", other)),
        }
    }
}

/// Columns that distinct-value listings are offered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistinctColumn {
    FileName,
    Animal,
    CompoundAnimal,
    Channel,
}

impl DistinctColumn {
    pub fn parse(column: &str) -> Option<Self> {
        match column {
            "file_name" => Some(DistinctColumn::FileName),
            "animal" => Some(DistinctColumn::Animal),
            "compound_animal" => Some(DistinctColumn::CompoundAnimal),
            "channel" => Some(DistinctColumn::Channel),
            _ => None,
        }
    }
}

/// How an event was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HowFound {
    #[serde(alias = "man")]
    Manual,
    #[serde(alias = "auto")]
    Automatic,
}

impl HowFound {
    pub fn as_str(self) -> &'static str {
        match self {
            HowFound::Manual => "manual",
            HowFound::Automatic => "automatic",
        }
    }
}

impl FromStr for HowFound {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" | "man" => Ok(HowFound::Manual),
            "automatic" | "auto" => Ok(HowFound::Automatic),
            other => Err(format!("unknown detection method '{}'", other)),
        }
    }
}

/// Review edit applied to an event, stored as a single character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditStatus {
    Appended,
    Joined,
    Deleted,
    Edited,
}

impl EditStatus {
    pub fn code(self) -> &'static str {
        match self {
            EditStatus::Appended => "a",
            EditStatus::Joined => "j",
            EditStatus::Deleted => "d",
            EditStatus::Edited => "e",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "a" => Some(EditStatus::Appended),
            "j" => Some(EditStatus::Joined),
            "d" => Some(EditStatus::Deleted),
            "e" => Some(EditStatus::Edited),
            _ => None,
        }
    }
}

impl FromStr for EditStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "appended" | "a" => Ok(EditStatus::Appended),
            "joined" | "j" => Ok(EditStatus::Joined),
            "deleted" | "d" => Ok(EditStatus::Deleted),
            "edited" | "e" => Ok(EditStatus::Edited),
            other => Err(format!("unknown edit status '{}'", other)),
        }
    }
}

/// Composite key of an event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventKey {
    pub animal: String,
    pub file_name: String,
    pub start: f64,
}

impl EventKey {
    pub fn new(animal: impl Into<String>, file_name: &str, start: f64) -> Self {
        Self {
            animal: animal.into(),
            file_name: base_name(file_name),
            start,
        }
    }
}

impl From<&EventDescriptor> for EventKey {
    fn from(event: &EventDescriptor) -> Self {
        EventKey::new(event.animal.clone(), &event.file_name, event.start)
    }
}

/// Which rows an existence check or a delete applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordSelector {
    /// Every row of a file table with this file name
    FileName { table: FileTable, file_name: String },
    /// One animal's row for one file
    DataFile {
        table: FileTable,
        animal: String,
        file_name: String,
    },
    /// Every file of one animal
    AnimalFiles { table: FileTable, animal: String },
    AlgorithmParameters { animal: String },
    Event(EventKey),
    /// Every channel mapped to a compound animal
    ChannelGroup { compound_animal: String },
}

impl RecordSelector {
    pub fn file_name(table: FileTable, file_name: &str) -> Self {
        RecordSelector::FileName {
            table,
            file_name: base_name(file_name),
        }
    }

    /// Select the row a `NewRecord::DataFile` with the same path and
    /// channel would have written.
    pub fn data_file(table: FileTable, path: &Path, channel: &ChannelData) -> Self {
        RecordSelector::DataFile {
            table,
            animal: channel.name.clone(),
            file_name: base_name(&path.to_string_lossy()),
        }
    }

    pub fn table(&self) -> Table {
        match self {
            RecordSelector::FileName { table, .. }
            | RecordSelector::DataFile { table, .. }
            | RecordSelector::AnimalFiles { table, .. } => (*table).into(),
            RecordSelector::AlgorithmParameters { .. } => Table::AlgorithmParameters,
            RecordSelector::Event(_) => Table::Events,
            RecordSelector::ChannelGroup { .. } => Table::AnimalChannelList,
        }
    }
}

/// A row to insert, one variant per entity.
#[derive(Debug, Clone, PartialEq)]
pub enum NewRecord {
    /// A recording file; name and directory are taken from `path`
    DataFile {
        table: FileTable,
        path: PathBuf,
        channel: ChannelData,
    },
    Event(EventDescriptor),
    /// A channel mapping, or a bare compound animal entry when `channel` is `None`
    ChannelMapping {
        compound_animal: String,
        channel: Option<String>,
    },
    /// Default analysis parameters for an animal
    AlgorithmParameters { animal: String },
}

impl NewRecord {
    pub fn table(&self) -> Table {
        match self {
            NewRecord::DataFile { table, .. } => (*table).into(),
            NewRecord::Event(_) => Table::Events,
            NewRecord::ChannelMapping { .. } => Table::AnimalChannelList,
            NewRecord::AlgorithmParameters { .. } => Table::AlgorithmParameters,
        }
    }
}

/// Changes to active recording files of one animal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingFileUpdate {
    pub animal: String,
    /// Applied to every active file of the animal
    pub video_file_path: Option<String>,
    /// Applied to the named file only
    pub reviewed: Option<ReviewMark>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewMark {
    pub file_name: String,
    pub reviewed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_table_names_round_trip() {
        for table in [FileTable::Active, FileTable::Unreviewed] {
            assert_eq!(table.table_name().parse::<FileTable>().unwrap(), table);
        }
        assert!("Events".parse::<FileTable>().is_err());
    }

    #[test]
    fn test_file_table_other() {
        assert_eq!(FileTable::Active.other(), FileTable::Unreviewed);
        assert_eq!(FileTable::Unreviewed.other(), FileTable::Active);
    }

    #[test]
    fn test_distinct_column_parse() {
        assert_eq!(DistinctColumn::parse("channel"), Some(DistinctColumn::Channel));
        assert_eq!(DistinctColumn::parse("file_path"), None);
    }

    #[test]
    fn test_edit_status_codes() {
        for status in [
            EditStatus::Appended,
            EditStatus::Joined,
            EditStatus::Deleted,
            EditStatus::Edited,
        ] {
            assert_eq!(EditStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(EditStatus::from_code("x"), None);
    }

    #[test]
    fn test_selector_strips_directories() {
        let sel = RecordSelector::file_name(FileTable::Active, "/data/eeg/f1.dat");
        assert_eq!(
            sel,
            RecordSelector::FileName {
                table: FileTable::Active,
                file_name: "f1.dat".into()
            }
        );
        let key = EventKey::new("ratA", "/data/eeg/f1.dat", 1.0);
        assert_eq!(key.file_name, "f1.dat");
    }

    #[test]
    fn test_selector_tables() {
        assert_eq!(
            RecordSelector::AlgorithmParameters { animal: "ratA".into() }.table(),
            Table::AlgorithmParameters
        );
        assert_eq!(
            RecordSelector::AnimalFiles {
                table: FileTable::Unreviewed,
                animal: "ratA".into()
            }
            .table(),
            Table::UnusedDataFiles
        );
    }

    #[test]
    fn test_new_record_tables() {
        let params = NewRecord::AlgorithmParameters { animal: "ratA".into() };
        assert_eq!(params.table(), Table::AlgorithmParameters);

        let mapping = NewRecord::ChannelMapping {
            compound_animal: "ratA_ratB".into(),
            channel: None,
        };
        assert_eq!(mapping.table(), Table::AnimalChannelList);
    }
}
