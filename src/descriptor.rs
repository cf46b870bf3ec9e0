//! Value objects handed in by acquisition and detection code
//!
//! A [`ChannelData`] describes one channel of a recording file as the
//! acquisition reader sees it; an [`EventDescriptor`] describes one
//! annotated or detected event. Both deserialize from the field names the
//! analysis tools emit.

use crate::error::{DbError, Result};
use crate::record::HowFound;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// One channel of a multi-channel recording file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelData {
    /// Animal recorded on this channel
    pub name: String,
    /// Index of the channel inside the file
    pub idx: i32,
    /// Recording length in samples
    pub file_length: i64,
    /// Number of channels in the file
    pub number: i32,
    pub sample_freq: i32,
    /// year, month, day, hour, minute, second[, ...]
    #[serde(default)]
    pub file_start: Option<Vec<i32>>,
}

impl ChannelData {
    /// Build the recording start time, if one was supplied.
    ///
    /// `Ok(None)` means the reader reported no start at all; an error means
    /// one was reported but does not form a valid date/time.
    pub fn start_time(&self) -> std::result::Result<Option<NaiveDateTime>, TimestampError> {
        match &self.file_start {
            Some(fields) => file_start_from_fields(fields).map(Some),
            None => Ok(None),
        }
    }
}

/// An event to be written to the events table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventDescriptor {
    pub animal: String,
    /// Path or bare name of the recording file the event lies in
    pub file_name: String,
    /// Seconds from the beginning of the file
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub racine_score: Option<i32>,
    #[serde(rename = "Event", default)]
    pub event_type: Option<String>,
    pub how_found: HowFound,
    #[serde(default)]
    pub channel_no: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("expected at least 6 date/time fields, got {0}")]
    TooFewFields(usize),
    #[error("{0:?} is not a valid date/time")]
    OutOfRange(Vec<i32>),
}

/// Build a timestamp from `[year, month, day, hour, minute, second, ...]`.
/// Fields past the sixth are ignored.
pub fn file_start_from_fields(fields: &[i32]) -> std::result::Result<NaiveDateTime, TimestampError> {
    if fields.len() < 6 {
        return Err(TimestampError::TooFewFields(fields.len()));
    }
    let out_of_range = || TimestampError::OutOfRange(fields[..6].to_vec());
    let unsigned = |v: i32| u32::try_from(v).map_err(|_| out_of_range());

    NaiveDate::from_ymd_opt(fields[0], unsigned(fields[1])?, unsigned(fields[2])?)
        .and_then(|date| {
            date.and_hms_opt(
                u32::try_from(fields[3]).ok()?,
                u32::try_from(fields[4]).ok()?,
                u32::try_from(fields[5]).ok()?,
            )
        })
        .ok_or_else(out_of_range)
}

/// Split a recording path into its absolute directory and its file name.
pub fn split_path(path: &Path) -> Result<(String, String)> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| DbError::InvalidPath(path.display().to_string()))?;
    let absolute = std::path::absolute(path)
        .map_err(|e| DbError::InvalidPath(format!("{}: {}", path.display(), e)))?;
    let dir = absolute
        .parent()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok((dir, name))
}

/// Last component of a path, or the input unchanged if it has none.
pub fn base_name(file_name: &str) -> String {
    Path::new(file_name)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file_name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_file_start_from_six_fields() {
        let ts = file_start_from_fields(&[2016, 3, 14, 9, 26, 53]).unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2016, 3, 14).unwrap());
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (9, 26, 53));
    }

    #[test]
    fn test_file_start_ignores_extra_fields() {
        let ts = file_start_from_fields(&[2016, 3, 14, 9, 26, 53, 250, 0, -1]).unwrap();
        assert_eq!(ts.second(), 53);
    }

    #[test]
    fn test_file_start_too_few_fields() {
        assert_eq!(
            file_start_from_fields(&[2016, 3, 14]),
            Err(TimestampError::TooFewFields(3))
        );
    }

    #[test]
    fn test_file_start_out_of_range() {
        assert!(matches!(
            file_start_from_fields(&[2016, 13, 1, 0, 0, 0]),
            Err(TimestampError::OutOfRange(_))
        ));
        assert!(matches!(
            file_start_from_fields(&[2016, 1, 1, -4, 0, 0]),
            Err(TimestampError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_channel_data_without_start() {
        let chan = ChannelData {
            name: "ratA".into(),
            idx: 0,
            file_length: 1000,
            number: 4,
            sample_freq: 250,
            file_start: None,
        };
        assert_eq!(chan.start_time(), Ok(None));
    }

    #[test]
    fn test_split_path() {
        let (dir, name) = split_path(Path::new("/data/eeg/rat1.smr")).unwrap();
        assert_eq!(dir, "/data/eeg");
        assert_eq!(name, "rat1.smr");
    }

    #[test]
    fn test_split_path_relative_is_absolutised() {
        let (dir, name) = split_path(Path::new("rat1.smr")).unwrap();
        assert!(Path::new(&dir).is_absolute());
        assert_eq!(name, "rat1.smr");
    }

    #[test]
    fn test_split_path_without_file_name() {
        assert!(matches!(split_path(Path::new("/")), Err(DbError::InvalidPath(_))));
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("/data/eeg/rat1.smr"), "rat1.smr");
        assert_eq!(base_name("rat1.smr"), "rat1.smr");
    }

    #[test]
    fn test_event_descriptor_field_names() {
        let json = r#"{
            "Animal": "ratA",
            "FileName": "/data/f1.dat",
            "Start": 10.5,
            "End": 42.0,
            "Description": "tonic-clonic",
            "RacineScore": 5,
            "Event": "seizure",
            "HowFound": "manual"
        }"#;
        let event: EventDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(event.animal, "ratA");
        assert_eq!(event.event_type.as_deref(), Some("seizure"));
        assert_eq!(event.how_found, HowFound::Manual);
        assert_eq!(event.channel_no, None);
    }
}
