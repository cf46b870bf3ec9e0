//! SQLite database with Diesel ORM
//!
//! Stores recording files, events, per-animal analysis parameters and the
//! channel to animal mapping. Each method takes a connection from the pool,
//! runs one operation from [`ops`](crate::ops) and hands the connection
//! back; [`Database::transaction`] runs several operations in one session.

use crate::config::StoreConfig;
use crate::error::{DbError, Result, StoreWarning};
use crate::models::*;
use crate::ops;
use crate::record::*;
use crate::record::Table;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

type DbPool = Pool<ConnectionManager<SqliteConnection>>;
type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Database connection wrapper with connection pool
pub struct Database {
    pool: DbPool,
    path: PathBuf,
}

impl Database {
    /// Open database at specified path
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_pool(path.as_ref(), StoreConfig::default().pool_size)
    }

    /// Open the database a config points at
    pub fn open_with(config: &StoreConfig) -> Result<Self> {
        Self::open_pool(&config.database_path(), config.pool_size)
    }

    fn open_pool(path: &Path, pool_size: u32) -> Result<Self> {
        let path_str = path.to_string_lossy().to_string();
        let manager = ConnectionManager::<SqliteConnection>::new(&path_str);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e| DbError::Connection(e.to_string()))?;

        let db = Self {
            pool,
            path: path.to_path_buf(),
        };
        db.init_schema()?;
        log::debug!("opened store at {}", path.display());
        Ok(db)
    }

    /// File the store lives in
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn get_conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    fn with_conn<T>(&self, f: impl FnOnce(&mut SqliteConnection) -> Result<T>) -> Result<T> {
        let mut conn = self.get_conn()?;
        f(&mut *conn)
    }

    /// Create every table that does not exist yet. Existing tables are left as they are.
    pub fn init_schema(&self) -> Result<()> {
        let mut conn = self.get_conn()?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS AnimalChannelList (
                id INTEGER PRIMARY KEY NOT NULL,
                compound_animal TEXT,
                channel TEXT
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS DataFiles (
                animal TEXT NOT NULL,
                file_name TEXT NOT NULL,
                file_path TEXT,
                file_start TIMESTAMP,
                chan_number INTEGER,
                chan_idx INTEGER,
                sample_freq INTEGER,
                file_length INTEGER,
                video_file_path TEXT,
                reviewed BOOLEAN NOT NULL DEFAULT 0,
                PRIMARY KEY (animal, file_name)
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS unusedDataFiles (
                animal TEXT NOT NULL,
                file_name TEXT NOT NULL,
                file_path TEXT,
                file_start TIMESTAMP,
                chan_number INTEGER,
                chan_idx INTEGER,
                sample_freq INTEGER,
                file_length INTEGER,
                video_file_path TEXT,
                PRIMARY KEY (animal, file_name)
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS AlgorithmParameters (
                animal TEXT PRIMARY KEY NOT NULL,
                window_size INTEGER NOT NULL,
                no_groups_per_epoch INTEGER NOT NULL,
                look_ahead INTEGER NOT NULL,
                threshold REAL NOT NULL,
                proxthreshold INTEGER NOT NULL,
                durationthreshold REAL NOT NULL,
                ampthreshold REAL NOT NULL,
                spikewindow INTEGER NOT NULL,
                slope_scaling_factor REAL NOT NULL,
                min_no_spikes INTEGER NOT NULL,
                min_spikerate REAL NOT NULL
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS Events (
                animal TEXT NOT NULL,
                filename TEXT NOT NULL,
                filepath TEXT,
                event_start REAL NOT NULL,
                event_end REAL,
                racine_score INTEGER,
                file_start TIMESTAMP,
                meta_text TEXT,
                channel_no INTEGER,
                event_type TEXT,
                how_found TEXT,
                edit_status CHAR(1),
                PRIMARY KEY (animal, filename, event_start)
            )
        "#).execute(&mut conn)?;

        // Create indexes
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_datafiles_file_name ON DataFiles(file_name)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_events_animal ON Events(animal)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_channels_channel ON AnimalChannelList(channel)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_channels_compound ON AnimalChannelList(compound_animal)").execute(&mut conn)?;

        Ok(())
    }

    /// Run `f` in one transaction on one connection. Everything done through
    /// `ops` inside commits when `f` returns `Ok` and rolls back otherwise.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T>,
    {
        let mut conn = self.get_conn()?;
        let conn: &mut SqliteConnection = &mut conn;
        conn.transaction(f)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Whether any row matches the selector
    pub fn record_exists(&self, selector: &RecordSelector) -> Result<bool> {
        self.with_conn(|conn| ops::record_exists(conn, selector))
    }

    /// Insert one record, returning any fields that had to be left unset
    pub fn add_record(&self, record: &NewRecord) -> Result<Vec<StoreWarning>> {
        self.with_conn(|conn| ops::add_record(conn, record))
    }

    /// Update active recording files; returns the number of rows changed
    pub fn update_record(&self, update: &RecordingFileUpdate) -> Result<usize> {
        self.with_conn(|conn| ops::update_record(conn, update))
    }

    /// Delete all matching rows. `false` if nothing matched.
    pub fn remove_record(&self, selector: &RecordSelector) -> Result<bool> {
        let deleted = self.with_conn(|conn| ops::remove_record(conn, selector))?;
        Ok(deleted > 0)
    }

    /// Move all files of an animal from `from` to the other file table.
    /// Returns how many were moved; zero if the animal had none there.
    pub fn move_recording_files(&self, from: FileTable, animal: &str) -> Result<usize> {
        self.with_conn(|conn| ops::move_recording_files(conn, from, animal))
    }

    /// Overwrite (or create) the parameters of one animal
    pub fn save_analysis_parameters(&self, params: &AnalysisParameters) -> Result<()> {
        self.with_conn(|conn| ops::save_analysis_parameters(conn, params))
    }

    pub fn set_event_edit_status(&self, key: &EventKey, status: EditStatus) -> Result<usize> {
        self.with_conn(|conn| ops::set_event_edit_status(conn, key, status))
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn list_distinct_values(&self, table: Table, column: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| ops::list_distinct_values(conn, table, column))
    }

    pub fn build_channel_animal_map(&self) -> Result<BTreeMap<String, String>> {
        self.with_conn(ops::build_channel_animal_map)
    }

    pub fn find_events_in_file(&self, animal: &str, file_name: &str) -> Result<Vec<Event>> {
        self.with_conn(|conn| ops::find_events_in_file(conn, animal, file_name))
    }

    pub fn find_unreviewed_files(&self, animal: &str) -> Result<Vec<UnreviewedRecordingFile>> {
        self.with_conn(|conn| ops::find_unreviewed_files(conn, animal))
    }

    pub fn find_recording_files(&self, animal: &str, file_name: &str) -> Result<Vec<RecordingFile>> {
        self.with_conn(|conn| ops::find_recording_files(conn, animal, file_name))
    }

    /// The one mapping for a channel label
    pub fn find_channel(&self, channel: &str) -> Result<ChannelMapping> {
        self.with_conn(|conn| ops::find_channel(conn, channel))
    }

    pub fn find_channels_for_animal(&self, compound_animal: &str) -> Result<Vec<ChannelMapping>> {
        self.with_conn(|conn| ops::find_channels_for_animal(conn, compound_animal))
    }

    pub fn get_files_for_animal(&self, animal: &str) -> Result<Vec<RecordingFile>> {
        self.with_conn(|conn| ops::get_files_for_animal(conn, animal))
    }

    pub fn get_channels_for_file(&self, file_name: &str) -> Result<Vec<RecordingFile>> {
        self.with_conn(|conn| ops::get_channels_for_file(conn, file_name))
    }

    pub fn get_events_for_animal(&self, animal: &str) -> Result<Vec<Event>> {
        self.with_conn(|conn| ops::get_events_for_animal(conn, animal))
    }

    pub fn get_analysis_parameters(&self, animal: &str) -> Result<Option<AnalysisParameters>> {
        self.with_conn(|conn| ops::get_analysis_parameters(conn, animal))
    }
}
