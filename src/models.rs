//! Diesel row types
//!
//! Field order follows the column order in `schema.rs`.

use crate::schema::*;
use chrono::NaiveDateTime;
use diesel::prelude::*;

// ============================================================================
// Channel Mapping
// ============================================================================

/// Queryable channel mapping
#[derive(Queryable, Selectable, Debug, Clone, PartialEq, serde::Serialize)]
#[diesel(table_name = animal_channel_list)]
pub struct ChannelMapping {
    pub id: i32,
    pub compound_animal: Option<String>,
    pub channel: Option<String>,
}

/// Insertable channel mapping
#[derive(Insertable)]
#[diesel(table_name = animal_channel_list)]
pub struct NewChannelMapping<'a> {
    pub compound_animal: Option<&'a str>,
    pub channel: Option<&'a str>,
}

// ============================================================================
// Recording Files
// ============================================================================

/// A recording file in the active analysis set
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, serde::Serialize)]
#[diesel(table_name = data_files)]
pub struct RecordingFile {
    pub animal: String,
    pub file_name: String,
    pub file_path: Option<String>,
    pub file_start: Option<NaiveDateTime>,
    pub chan_number: Option<i32>,
    pub chan_idx: Option<i32>,
    pub sample_freq: Option<i32>,
    pub file_length: Option<i64>,
    pub video_file_path: Option<String>,
    pub reviewed: bool,
}

/// A recording file that has not been triaged yet
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, serde::Serialize)]
#[diesel(table_name = unused_data_files)]
pub struct UnreviewedRecordingFile {
    pub animal: String,
    pub file_name: String,
    pub file_path: Option<String>,
    pub file_start: Option<NaiveDateTime>,
    pub chan_number: Option<i32>,
    pub chan_idx: Option<i32>,
    pub sample_freq: Option<i32>,
    pub file_length: Option<i64>,
    pub video_file_path: Option<String>,
}

impl From<UnreviewedRecordingFile> for RecordingFile {
    /// Files entering the active set start out unreviewed.
    fn from(f: UnreviewedRecordingFile) -> Self {
        RecordingFile {
            animal: f.animal,
            file_name: f.file_name,
            file_path: f.file_path,
            file_start: f.file_start,
            chan_number: f.chan_number,
            chan_idx: f.chan_idx,
            sample_freq: f.sample_freq,
            file_length: f.file_length,
            video_file_path: f.video_file_path,
            reviewed: false,
        }
    }
}

impl From<RecordingFile> for UnreviewedRecordingFile {
    fn from(f: RecordingFile) -> Self {
        UnreviewedRecordingFile {
            animal: f.animal,
            file_name: f.file_name,
            file_path: f.file_path,
            file_start: f.file_start,
            chan_number: f.chan_number,
            chan_idx: f.chan_idx,
            sample_freq: f.sample_freq,
            file_length: f.file_length,
            video_file_path: f.video_file_path,
        }
    }
}

// ============================================================================
// Analysis Parameters
// ============================================================================

/// Detection parameters for one animal. Constant for an animal over the
/// whole experiment, hence keyed on the animal alone.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[diesel(table_name = algorithm_parameters)]
pub struct AnalysisParameters {
    pub animal: String,
    /// Length of one group window in ms
    pub window_size: i32,
    /// Groups per epoch; epoch length is `no_groups_per_epoch * window_size`
    pub no_groups_per_epoch: i32,
    /// Number of groups ahead the autocorrelation is computed over
    pub look_ahead: i32,
    /// Metric values within `threshold` standard deviations of the mean are discarded
    pub threshold: f64,
    pub proxthreshold: i32,
    /// Minimum length of a single event in seconds
    pub durationthreshold: f64,
    pub ampthreshold: f64,
    /// Window in ms within which one spike can occur
    pub spikewindow: i32,
    pub slope_scaling_factor: f64,
    pub min_no_spikes: i32,
    pub min_spikerate: f64,
}

impl AnalysisParameters {
    pub fn with_defaults(animal: impl Into<String>) -> Self {
        Self {
            animal: animal.into(),
            window_size: 500,
            no_groups_per_epoch: 100,
            look_ahead: 2,
            threshold: 1.0,
            proxthreshold: 1,
            durationthreshold: 2.0,
            ampthreshold: 1.0,
            spikewindow: 15,
            slope_scaling_factor: 5.0,
            min_no_spikes: 15,
            min_spikerate: 0.35,
        }
    }
}

// ============================================================================
// Events
// ============================================================================

/// A detected or annotated event. Times are seconds from the start of the file.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, serde::Serialize)]
#[diesel(table_name = events)]
pub struct Event {
    pub animal: String,
    pub filename: String,
    pub filepath: Option<String>,
    pub event_start: f64,
    pub event_end: Option<f64>,
    pub racine_score: Option<i32>,
    /// Copied from the recording file when the event was added
    pub file_start: Option<NaiveDateTime>,
    pub meta_text: Option<String>,
    pub channel_no: Option<i32>,
    pub event_type: Option<String>,
    pub how_found: Option<String>,
    pub edit_status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_defaults() {
        let p = AnalysisParameters::with_defaults("ratA");
        assert_eq!(p.animal, "ratA");
        assert_eq!(p.window_size, 500);
        assert_eq!(p.no_groups_per_epoch, 100);
        assert_eq!(p.look_ahead, 2);
        assert_eq!(p.threshold, 1.0);
        assert_eq!(p.proxthreshold, 1);
        assert_eq!(p.durationthreshold, 2.0);
        assert_eq!(p.ampthreshold, 1.0);
        assert_eq!(p.spikewindow, 15);
        assert_eq!(p.min_spikerate, 0.35);
        assert_eq!(p.slope_scaling_factor, 5.0);
        assert_eq!(p.min_no_spikes, 15);
    }

    #[test]
    fn test_file_conversion_resets_reviewed() {
        let active = RecordingFile {
            animal: "ratA".into(),
            file_name: "f1.dat".into(),
            file_path: Some("/data".into()),
            file_start: None,
            chan_number: Some(4),
            chan_idx: Some(1),
            sample_freq: Some(250),
            file_length: Some(90_000),
            video_file_path: Some("/video/f1.avi".into()),
            reviewed: true,
        };
        let unreviewed = UnreviewedRecordingFile::from(active.clone());
        assert_eq!(unreviewed.video_file_path, active.video_file_path);
        let back = RecordingFile::from(unreviewed);
        assert!(!back.reviewed);
        assert_eq!(back.file_length, active.file_length);
    }
}
