//! Store operations on a single connection
//!
//! Every function here runs on a connection the caller owns. Called through
//! [`Database`](crate::Database) each one gets its own pooled connection and
//! commits on return; called inside [`Database::transaction`](crate::Database::transaction)
//! they share one session and commit or roll back together.

use crate::descriptor::{base_name, split_path, EventDescriptor};
use crate::error::{DbError, Result, StoreWarning};
use crate::models::*;
use crate::record::*;
use crate::record::Table;
use crate::schema::*;
use chrono::NaiveDateTime;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::collections::BTreeMap;
use std::path::Path;

// ============================================================================
// Existence / Delete
// ============================================================================

/// Whether any row matches the selector.
pub fn record_exists(conn: &mut SqliteConnection, selector: &RecordSelector) -> Result<bool> {
    let found: bool = match selector {
        RecordSelector::FileName { table: FileTable::Active, file_name } => {
            diesel::select(exists(data_files::table.filter(data_files::file_name.eq(file_name))))
                .get_result::<bool>(conn)?
        }
        RecordSelector::FileName { table: FileTable::Unreviewed, file_name } => diesel::select(exists(
            unused_data_files::table.filter(unused_data_files::file_name.eq(file_name)),
        ))
        .get_result::<bool>(conn)?,
        RecordSelector::DataFile { table: FileTable::Active, animal, file_name } => diesel::select(exists(
            data_files::table
                .filter(data_files::file_name.eq(file_name))
                .filter(data_files::animal.eq(animal)),
        ))
        .get_result::<bool>(conn)?,
        RecordSelector::DataFile { table: FileTable::Unreviewed, animal, file_name } => {
            diesel::select(exists(
                unused_data_files::table
                    .filter(unused_data_files::file_name.eq(file_name))
                    .filter(unused_data_files::animal.eq(animal)),
            ))
            .get_result::<bool>(conn)?
        }
        RecordSelector::AnimalFiles { table: FileTable::Active, animal } => {
            diesel::select(exists(data_files::table.filter(data_files::animal.eq(animal))))
                .get_result::<bool>(conn)?
        }
        RecordSelector::AnimalFiles { table: FileTable::Unreviewed, animal } => diesel::select(exists(
            unused_data_files::table.filter(unused_data_files::animal.eq(animal)),
        ))
        .get_result::<bool>(conn)?,
        RecordSelector::AlgorithmParameters { animal } => diesel::select(exists(
            algorithm_parameters::table.filter(algorithm_parameters::animal.eq(animal)),
        ))
        .get_result::<bool>(conn)?,
        RecordSelector::Event(key) => diesel::select(exists(
            events::table
                .filter(events::event_start.eq(key.start))
                .filter(events::animal.eq(&key.animal))
                .filter(events::filename.eq(&key.file_name)),
        ))
        .get_result::<bool>(conn)?,
        RecordSelector::ChannelGroup { compound_animal } => diesel::select(exists(
            animal_channel_list::table
                .filter(animal_channel_list::compound_animal.eq(compound_animal.as_str())),
        ))
        .get_result::<bool>(conn)?,
    };

    log::debug!("{} exists in {}: {}", describe(selector), selector.table().table_name(), found);
    Ok(found)
}

/// Delete every row matching the selector in one statement. Returns the
/// number of rows removed; zero leaves the store untouched.
pub fn remove_record(conn: &mut SqliteConnection, selector: &RecordSelector) -> Result<usize> {
    let deleted = match selector {
        RecordSelector::FileName { table: FileTable::Active, file_name } => {
            diesel::delete(data_files::table.filter(data_files::file_name.eq(file_name))).execute(conn)?
        }
        RecordSelector::FileName { table: FileTable::Unreviewed, file_name } => diesel::delete(
            unused_data_files::table.filter(unused_data_files::file_name.eq(file_name)),
        )
        .execute(conn)?,
        RecordSelector::DataFile { table: FileTable::Active, animal, file_name } => diesel::delete(
            data_files::table
                .filter(data_files::file_name.eq(file_name))
                .filter(data_files::animal.eq(animal)),
        )
        .execute(conn)?,
        RecordSelector::DataFile { table: FileTable::Unreviewed, animal, file_name } => {
            diesel::delete(
                unused_data_files::table
                    .filter(unused_data_files::file_name.eq(file_name))
                    .filter(unused_data_files::animal.eq(animal)),
            )
            .execute(conn)?
        }
        RecordSelector::AnimalFiles { table: FileTable::Active, animal } => {
            diesel::delete(data_files::table.filter(data_files::animal.eq(animal))).execute(conn)?
        }
        RecordSelector::AnimalFiles { table: FileTable::Unreviewed, animal } => {
            diesel::delete(unused_data_files::table.filter(unused_data_files::animal.eq(animal)))
                .execute(conn)?
        }
        RecordSelector::AlgorithmParameters { animal } => diesel::delete(
            algorithm_parameters::table.filter(algorithm_parameters::animal.eq(animal)),
        )
        .execute(conn)?,
        RecordSelector::Event(key) => diesel::delete(
            events::table
                .filter(events::event_start.eq(key.start))
                .filter(events::animal.eq(&key.animal))
                .filter(events::filename.eq(&key.file_name)),
        )
        .execute(conn)?,
        RecordSelector::ChannelGroup { compound_animal } => diesel::delete(
            animal_channel_list::table
                .filter(animal_channel_list::compound_animal.eq(compound_animal.as_str())),
        )
        .execute(conn)?,
    };

    log::debug!(
        "removed {} row(s) from {} for {}",
        deleted,
        selector.table().table_name(),
        describe(selector)
    );
    Ok(deleted)
}

fn describe(selector: &RecordSelector) -> String {
    match selector {
        RecordSelector::FileName { file_name, .. } => format!("file '{}'", file_name),
        RecordSelector::DataFile { animal, file_name, .. } => format!("'{}/{}'", animal, file_name),
        RecordSelector::AnimalFiles { animal, .. } | RecordSelector::AlgorithmParameters { animal } => {
            format!("animal '{}'", animal)
        }
        RecordSelector::Event(key) => {
            format!("event '{}/{}' @ {}s", key.animal, key.file_name, key.start)
        }
        RecordSelector::ChannelGroup { compound_animal } => format!("compound animal '{}'", compound_animal),
    }
}

// ============================================================================
// Insert / Update
// ============================================================================

/// Insert exactly one row into the table the record belongs to.
///
/// A recording file whose start time cannot be built is still written, with
/// the start left empty and a [`StoreWarning::FileStartUnset`] returned. A
/// file already held by the other file table is refused.
pub fn add_record(conn: &mut SqliteConnection, record: &NewRecord) -> Result<Vec<StoreWarning>> {
    let mut warnings = Vec::new();
    log::trace!("insert into {}", record.table().table_name());

    match record {
        NewRecord::DataFile { table, path, channel } => {
            let (dir, file_name) = split_path(path)?;
            let in_other = record_exists(
                conn,
                &RecordSelector::DataFile {
                    table: table.other(),
                    animal: channel.name.clone(),
                    file_name: file_name.clone(),
                },
            )?;
            if in_other {
                return Err(DbError::AlreadyInOtherTable {
                    animal: channel.name.clone(),
                    file_name,
                    table: table.other().table_name(),
                });
            }

            let file_start = match channel.start_time() {
                Ok(start) => start,
                Err(reason) => {
                    log::warn!(
                        "{}/{}: file start {:?} unusable ({}), leaving it unset",
                        channel.name,
                        file_name,
                        channel.file_start,
                        reason
                    );
                    warnings.push(StoreWarning::FileStartUnset {
                        animal: channel.name.clone(),
                        file_name: file_name.clone(),
                        reason,
                    });
                    None
                }
            };

            let row = RecordingFile {
                animal: channel.name.clone(),
                file_name,
                file_path: Some(dir),
                file_start,
                chan_number: Some(channel.number),
                chan_idx: Some(channel.idx),
                sample_freq: Some(channel.sample_freq),
                file_length: Some(channel.file_length),
                video_file_path: None,
                reviewed: false,
            };
            log::debug!("adding {}/{} to {}", row.animal, row.file_name, table);

            match table {
                FileTable::Active => diesel::insert_into(data_files::table).values(&row).execute(conn)?,
                FileTable::Unreviewed => diesel::insert_into(unused_data_files::table)
                    .values(&UnreviewedRecordingFile::from(row))
                    .execute(conn)?,
            };
        }

        NewRecord::Event(event) => {
            let row = event_row(conn, event)?;
            log::debug!("adding event {}/{} @ {}s", row.animal, row.filename, row.event_start);
            diesel::insert_into(events::table).values(&row).execute(conn)?;
        }

        NewRecord::ChannelMapping { compound_animal, channel } => {
            log::debug!("mapping channel {:?} to '{}'", channel, compound_animal);
            diesel::insert_into(animal_channel_list::table)
                .values(&NewChannelMapping {
                    compound_animal: Some(compound_animal.as_str()),
                    channel: channel.as_deref(),
                })
                .execute(conn)?;
        }

        NewRecord::AlgorithmParameters { animal } => {
            log::debug!("adding default parameters for '{}'", animal);
            diesel::insert_into(algorithm_parameters::table)
                .values(&AnalysisParameters::with_defaults(animal.as_str()))
                .execute(conn)?;
        }
    }

    Ok(warnings)
}

/// Build the event row, copying the file start from the first active
/// recording file with the event's file name.
fn event_row(conn: &mut SqliteConnection, event: &EventDescriptor) -> Result<Event> {
    let file_name = base_name(&event.file_name);
    let (dir, _) = split_path(Path::new(&event.file_name))?;

    let file_start = data_files::table
        .filter(data_files::file_name.eq(&file_name))
        .select(data_files::file_start)
        .first::<Option<NaiveDateTime>>(conn)
        .optional()?
        .ok_or_else(|| DbError::MissingRecordingFile {
            file_name: file_name.clone(),
        })?;

    Ok(Event {
        animal: event.animal.clone(),
        filename: file_name,
        filepath: Some(dir),
        event_start: event.start,
        event_end: Some(event.end),
        racine_score: event.racine_score,
        file_start,
        meta_text: event.description.clone(),
        channel_no: event.channel_no,
        event_type: event.event_type.clone(),
        how_found: Some(event.how_found.as_str().to_string()),
        edit_status: None,
    })
}

/// Apply the update to active recording files. The video path and the
/// reviewed flag are independent filtered updates; returns the total number
/// of rows touched, which may be zero.
pub fn update_record(conn: &mut SqliteConnection, update: &RecordingFileUpdate) -> Result<usize> {
    let mut changed = 0;

    if let Some(video) = &update.video_file_path {
        changed += diesel::update(data_files::table.filter(data_files::animal.eq(&update.animal)))
            .set(data_files::video_file_path.eq(Some(video.as_str())))
            .execute(conn)?;
    }

    if let Some(mark) = &update.reviewed {
        changed += diesel::update(
            data_files::table
                .filter(data_files::animal.eq(&update.animal))
                .filter(data_files::file_name.eq(&mark.file_name)),
        )
        .set(data_files::reviewed.eq(mark.reviewed))
        .execute(conn)?;
    }

    log::debug!("updated {} row(s) for '{}'", changed, update.animal);
    Ok(changed)
}

/// Replace the parameter row for an animal, creating it if absent.
pub fn save_analysis_parameters(conn: &mut SqliteConnection, params: &AnalysisParameters) -> Result<()> {
    diesel::replace_into(algorithm_parameters::table)
        .values(params)
        .execute(conn)?;
    log::debug!("saved parameters for '{}'", params.animal);
    Ok(())
}

/// Record a review edit on one event. Returns the number of rows changed.
pub fn set_event_edit_status(conn: &mut SqliteConnection, key: &EventKey, status: EditStatus) -> Result<usize> {
    let changed = diesel::update(
        events::table
            .filter(events::event_start.eq(key.start))
            .filter(events::animal.eq(&key.animal))
            .filter(events::filename.eq(&key.file_name)),
    )
    .set(events::edit_status.eq(Some(status.code())))
    .execute(conn)?;
    Ok(changed)
}

// ============================================================================
// Move Between Tables
// ============================================================================

/// Move every file of `animal` out of `from` into the other file table.
///
/// Copy and delete run in one transaction, so a failure part way leaves
/// both tables as they were. Returns the number of files moved; zero means
/// the animal had no files in `from`.
pub fn move_recording_files(conn: &mut SqliteConnection, from: FileTable, animal: &str) -> Result<usize> {
    let moved = conn.transaction::<_, DbError, _>(|conn| {
        let moved = match from {
            FileTable::Active => {
                let rows = data_files::table
                    .filter(data_files::animal.eq(animal))
                    .load::<RecordingFile>(conn)?;
                for row in &rows {
                    diesel::insert_into(unused_data_files::table)
                        .values(&UnreviewedRecordingFile::from(row.clone()))
                        .execute(conn)?;
                }
                diesel::delete(data_files::table.filter(data_files::animal.eq(animal))).execute(conn)?;
                rows.len()
            }
            FileTable::Unreviewed => {
                let rows = unused_data_files::table
                    .filter(unused_data_files::animal.eq(animal))
                    .load::<UnreviewedRecordingFile>(conn)?;
                for row in &rows {
                    diesel::insert_into(data_files::table)
                        .values(&RecordingFile::from(row.clone()))
                        .execute(conn)?;
                }
                diesel::delete(unused_data_files::table.filter(unused_data_files::animal.eq(animal)))
                    .execute(conn)?;
                rows.len()
            }
        };
        Ok(moved)
    })?;

    log::debug!("moved {} file(s) of '{}' from {} to {}", moved, animal, from, from.other());
    Ok(moved)
}

// ============================================================================
// Listings
// ============================================================================

/// Distinct non-null values of `column` in `table`, in no particular order.
/// Columns that have no listing on that table give an empty list.
pub fn list_distinct_values(conn: &mut SqliteConnection, table: Table, column: &str) -> Result<Vec<String>> {
    let Some(col) = DistinctColumn::parse(column) else {
        log::debug!("no listing for column '{}', returning nothing", column);
        return Ok(Vec::new());
    };

    let values: Vec<String> = match (table, col) {
        (Table::DataFiles, DistinctColumn::FileName) => {
            data_files::table.select(data_files::file_name).distinct().load::<String>(conn)?
        }
        (Table::DataFiles, DistinctColumn::Animal) => {
            data_files::table.select(data_files::animal).distinct().load::<String>(conn)?
        }
        (Table::UnusedDataFiles, DistinctColumn::FileName) => unused_data_files::table
            .select(unused_data_files::file_name)
            .distinct()
            .load::<String>(conn)?,
        (Table::UnusedDataFiles, DistinctColumn::Animal) => unused_data_files::table
            .select(unused_data_files::animal)
            .distinct()
            .load::<String>(conn)?,
        (Table::Events, DistinctColumn::FileName) => {
            events::table.select(events::filename).distinct().load::<String>(conn)?
        }
        (Table::Events, DistinctColumn::Animal) => events::table.select(events::animal).distinct().load::<String>(conn)?,
        (Table::AlgorithmParameters, DistinctColumn::Animal) => algorithm_parameters::table
            .select(algorithm_parameters::animal)
            .distinct()
            .load::<String>(conn)?,
        (Table::AnimalChannelList, DistinctColumn::CompoundAnimal) => animal_channel_list::table
            .select(animal_channel_list::compound_animal)
            .distinct()
            .load::<Option<String>>(conn)?
            .into_iter()
            .flatten()
            .collect(),
        (Table::AnimalChannelList, DistinctColumn::Channel) => animal_channel_list::table
            .select(animal_channel_list::channel)
            .distinct()
            .load::<Option<String>>(conn)?
            .into_iter()
            .flatten()
            .collect(),
        (table, _) => {
            log::debug!("{} has no '{}' listing, returning nothing", table.table_name(), column);
            Vec::new()
        }
    };

    Ok(values)
}

/// Channel label to compound animal, for every mapping that has both.
/// Later rows win when a channel label appears more than once.
pub fn build_channel_animal_map(conn: &mut SqliteConnection) -> Result<BTreeMap<String, String>> {
    let rows = animal_channel_list::table
        .order(animal_channel_list::id.asc())
        .load::<ChannelMapping>(conn)?;

    let mut map = BTreeMap::new();
    for row in rows {
        match (row.channel, row.compound_animal) {
            (Some(channel), Some(animal)) => {
                map.insert(channel, animal);
            }
            (Some(channel), None) => {
                log::warn!("channel '{}' has no compound animal, skipping", channel);
            }
            (None, _) => {}
        }
    }
    Ok(map)
}

// ============================================================================
// Retrieval
// ============================================================================

/// Events of one animal in one file, ordered by start time.
pub fn find_events_in_file(conn: &mut SqliteConnection, animal: &str, file_name: &str) -> Result<Vec<Event>> {
    let rows = events::table
        .filter(events::filename.eq(base_name(file_name)))
        .filter(events::animal.eq(animal))
        .order(events::event_start.asc())
        .load::<Event>(conn)?;
    Ok(rows)
}

/// Untriaged files of one animal.
pub fn find_unreviewed_files(conn: &mut SqliteConnection, animal: &str) -> Result<Vec<UnreviewedRecordingFile>> {
    let rows = unused_data_files::table
        .filter(unused_data_files::animal.eq(animal))
        .order(unused_data_files::file_name.asc())
        .load::<UnreviewedRecordingFile>(conn)?;
    Ok(rows)
}

/// Active rows for one animal and file name (zero or one, by key).
pub fn find_recording_files(
    conn: &mut SqliteConnection,
    animal: &str,
    file_name: &str,
) -> Result<Vec<RecordingFile>> {
    let rows = data_files::table
        .filter(data_files::animal.eq(animal))
        .filter(data_files::file_name.eq(base_name(file_name)))
        .load::<RecordingFile>(conn)?;
    Ok(rows)
}

/// The single mapping for a channel label. Fails if there is none or more than one.
pub fn find_channel(conn: &mut SqliteConnection, channel: &str) -> Result<ChannelMapping> {
    let mut rows = animal_channel_list::table
        .filter(animal_channel_list::channel.eq(channel))
        .load::<ChannelMapping>(conn)?;

    match rows.len() {
        0 => Err(DbError::NotFound {
            table: Table::AnimalChannelList.table_name(),
            key: channel.to_string(),
        }),
        1 => Ok(rows.remove(0)),
        count => Err(DbError::NotUnique {
            table: Table::AnimalChannelList.table_name(),
            key: channel.to_string(),
            count,
        }),
    }
}

/// Every channel mapped to a compound animal.
pub fn find_channels_for_animal(conn: &mut SqliteConnection, compound_animal: &str) -> Result<Vec<ChannelMapping>> {
    let rows = animal_channel_list::table
        .filter(animal_channel_list::compound_animal.eq(compound_animal))
        .order(animal_channel_list::id.asc())
        .load::<ChannelMapping>(conn)?;
    Ok(rows)
}

/// Active files of one animal.
pub fn get_files_for_animal(conn: &mut SqliteConnection, animal: &str) -> Result<Vec<RecordingFile>> {
    let rows = data_files::table
        .filter(data_files::animal.eq(animal))
        .order(data_files::file_name.asc())
        .load::<RecordingFile>(conn)?;
    Ok(rows)
}

/// Active rows for every animal recorded in one file, one per channel.
pub fn get_channels_for_file(conn: &mut SqliteConnection, file_name: &str) -> Result<Vec<RecordingFile>> {
    let rows = data_files::table
        .filter(data_files::file_name.eq(base_name(file_name)))
        .order(data_files::chan_idx.asc())
        .load::<RecordingFile>(conn)?;
    Ok(rows)
}

/// Every event of one animal across all files.
pub fn get_events_for_animal(conn: &mut SqliteConnection, animal: &str) -> Result<Vec<Event>> {
    let rows = events::table
        .filter(events::animal.eq(animal))
        .order((events::filename.asc(), events::event_start.asc()))
        .load::<Event>(conn)?;
    Ok(rows)
}

pub fn get_analysis_parameters(conn: &mut SqliteConnection, animal: &str) -> Result<Option<AnalysisParameters>> {
    let params = algorithm_parameters::table
        .filter(algorithm_parameters::animal.eq(animal))
        .first::<AnalysisParameters>(conn)
        .optional()?;
    Ok(params)
}
