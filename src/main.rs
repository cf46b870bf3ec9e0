use chrono::Local;
use clap::{Parser, Subcommand};
use eegdb::config::{DEFAULT_DB_PATH, DEFAULT_POOL_SIZE};
use eegdb::{
    ops, ChannelData, Database, DbError, EditStatus, EventDescriptor, EventKey, FileTable,
    HowFound, NewRecord, RecordSelector, RecordingFileUpdate, ReviewMark, StoreConfig, Table,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "eegdb")]
#[command(author, version, about = "Metadata store for EEG recordings and seizure events")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Database file or sqlite:/// URL
    #[arg(long, global = true, env = "EEGDB_DATABASE", default_value = DEFAULT_DB_PATH)]
    db: String,

    /// Connections kept open to the database
    #[arg(long, global = true, default_value_t = DEFAULT_POOL_SIZE)]
    pool_size: u32,

    /// Log every store operation
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print listings as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create any missing tables
    Init,

    /// Register one channel of a recording file
    AddFile {
        /// Path of the recording file
        path: PathBuf,

        /// Animal recorded on this channel
        #[arg(short, long)]
        animal: String,

        /// Index of the channel inside the file
        #[arg(long, default_value = "0")]
        idx: i32,

        /// Number of channels in the file
        #[arg(long, default_value = "1")]
        channels: i32,

        /// Sample frequency in Hz
        #[arg(long)]
        sample_freq: i32,

        /// Recording length in samples
        #[arg(long)]
        length: i64,

        /// Start as year,month,day,hour,minute,second
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        start: Option<Vec<i32>>,

        /// Add to the untriaged files instead of the active set
        #[arg(long)]
        unreviewed: bool,
    },

    /// Record an event in an active recording file
    AddEvent {
        animal: String,

        /// Recording file the event lies in
        file: String,

        /// Start in seconds from the beginning of the file
        start: f64,

        /// End in seconds from the beginning of the file
        end: f64,

        #[arg(short, long)]
        racine: Option<i32>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short = 't', long)]
        event_type: Option<String>,

        /// manual or automatic
        #[arg(long, default_value = "manual")]
        how_found: HowFound,

        /// Channel number in the acquisition file
        #[arg(long)]
        channel: Option<i32>,
    },

    /// Record every event in a JSON array of event descriptors, all or nothing
    ImportEvents {
        path: PathBuf,
    },

    /// Map a channel label to a compound animal
    AddChannel {
        compound_animal: String,

        /// Omit to create a bare compound animal entry
        channel: Option<String>,
    },

    /// Create default analysis parameters for an animal
    AddParams {
        animal: String,
    },

    /// Show the analysis parameters of an animal
    Params {
        animal: String,
    },

    /// Replace the analysis parameters of an animal from a JSON file
    SaveParams {
        path: PathBuf,
    },

    /// Check whether a recording file is registered
    ExistsFile {
        file: String,

        /// Only match this animal's row
        #[arg(short, long)]
        animal: Option<String>,

        #[arg(long)]
        unreviewed: bool,
    },

    /// Remove a recording file (every animal's row unless --animal is given)
    RemoveFile {
        file: String,

        #[arg(short, long)]
        animal: Option<String>,

        #[arg(long)]
        unreviewed: bool,
    },

    /// Remove one event
    RemoveEvent {
        animal: String,
        file: String,
        start: f64,
    },

    /// Remove every channel mapped to a compound animal
    RemoveChannels {
        compound_animal: String,
    },

    /// Mark an active file as reviewed
    Review {
        animal: String,
        file: String,

        /// Mark as not reviewed instead
        #[arg(long)]
        unset: bool,
    },

    /// Set the video file for all active files of an animal
    Video {
        animal: String,
        path: String,
    },

    /// Mark how an event was edited: appended, joined, deleted, edited
    EditStatus {
        animal: String,
        file: String,
        start: f64,
        status: EditStatus,
    },

    /// Move all files of an animal to the other file table
    Move {
        /// Table to move out of: DataFiles or unusedDataFiles
        #[arg(long)]
        from: FileTable,

        animal: String,
    },

    /// List the files of an animal
    Files {
        animal: String,

        #[arg(long)]
        unreviewed: bool,
    },

    /// List every animal's row for one active file
    Channels {
        file: String,
    },

    /// List the events of an animal
    Events {
        animal: String,

        /// Only events in this file
        #[arg(short, long)]
        file: Option<String>,
    },

    /// List distinct values of a column
    Distinct {
        /// DataFiles, unusedDataFiles, Events, AlgorithmParameters, AnimalChannelList
        table: Table,

        /// file_name, animal, compound_animal or channel
        column: String,
    },

    /// Show the channel to compound animal mapping
    ChannelMap,

    /// Create a backup of the database
    Backup {
        /// Output path for backup (default: eegdb_backup_<timestamp>.db)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn file_table(unreviewed: bool) -> FileTable {
    if unreviewed {
        FileTable::Unreviewed
    } else {
        FileTable::Active
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing output: {}", e),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("{}: {}", path.display(), e))
}

fn run(args: Args) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = StoreConfig::new(args.db).with_pool_size(args.pool_size);
    let db = Database::open_with(&config)?;
    let json = args.json;

    match args.command {
        Command::Init => {
            println!("Schema ready at {}", db.path().display());
        }

        Command::AddFile { path, animal, idx, channels, sample_freq, length, start, unreviewed } => {
            let table = file_table(unreviewed);
            let channel = ChannelData {
                name: animal,
                idx,
                file_length: length,
                number: channels,
                sample_freq,
                file_start: start,
            };
            let warnings = db.add_record(&NewRecord::DataFile { table, path: path.clone(), channel })?;
            for w in &warnings {
                eprintln!("Warning: {}", w);
            }
            println!("Added {} to {}", path.display(), table);
        }

        Command::AddEvent { animal, file, start, end, racine, description, event_type, how_found, channel } => {
            let event = EventDescriptor {
                animal,
                file_name: file,
                start,
                end,
                description,
                racine_score: racine,
                event_type,
                how_found,
                channel_no: channel,
            };
            db.add_record(&NewRecord::Event(event.clone()))?;
            println!("Added event {}/{} @ {}s", event.animal, event.file_name, event.start);
        }

        Command::ImportEvents { path } => {
            let events: Vec<EventDescriptor> = read_json(&path)?;
            let count = db.transaction(|conn| {
                for event in &events {
                    ops::add_record(conn, &NewRecord::Event(event.clone()))?;
                }
                Ok(events.len())
            })?;
            println!("Imported {} event(s)", count);
        }

        Command::AddChannel { compound_animal, channel } => {
            db.add_record(&NewRecord::ChannelMapping {
                compound_animal: compound_animal.clone(),
                channel: channel.clone(),
            })?;
            match channel {
                Some(c) => println!("Mapped {} to {}", c, compound_animal),
                None => println!("Added compound animal {}", compound_animal),
            }
        }

        Command::AddParams { animal } => {
            db.add_record(&NewRecord::AlgorithmParameters { animal: animal.clone() })?;
            println!("Added default parameters for {}", animal);
        }

        Command::Params { animal } => match db.get_analysis_parameters(&animal)? {
            Some(params) => print_json(&params),
            None => println!("No parameters for {}.", animal),
        },

        Command::SaveParams { path } => {
            let params: eegdb::AnalysisParameters = read_json(&path)?;
            db.save_analysis_parameters(&params)?;
            println!("Saved parameters for {}", params.animal);
        }

        Command::ExistsFile { file, animal, unreviewed } => {
            let table = file_table(unreviewed);
            let selector = match animal {
                Some(animal) => RecordSelector::DataFile {
                    table,
                    animal,
                    file_name: eegdb::descriptor::base_name(&file),
                },
                None => RecordSelector::file_name(table, &file),
            };
            let found = db.record_exists(&selector)?;
            println!("{}", if found { "yes" } else { "no" });
            if !found {
                return Ok(ExitCode::FAILURE);
            }
        }

        Command::RemoveFile { file, animal, unreviewed } => {
            let table = file_table(unreviewed);
            let selector = match animal {
                Some(animal) => RecordSelector::DataFile {
                    table,
                    animal,
                    file_name: eegdb::descriptor::base_name(&file),
                },
                None => RecordSelector::file_name(table, &file),
            };
            report_removal(db.remove_record(&selector)?, &file);
        }

        Command::RemoveEvent { animal, file, start } => {
            let key = EventKey::new(animal, &file, start);
            report_removal(db.remove_record(&RecordSelector::Event(key))?, &file);
        }

        Command::RemoveChannels { compound_animal } => {
            let selector = RecordSelector::ChannelGroup { compound_animal: compound_animal.clone() };
            report_removal(db.remove_record(&selector)?, &compound_animal);
        }

        Command::Review { animal, file, unset } => {
            let changed = db.update_record(&RecordingFileUpdate {
                animal,
                video_file_path: None,
                reviewed: Some(ReviewMark { file_name: file, reviewed: !unset }),
            })?;
            println!("Updated {} file(s)", changed);
        }

        Command::Video { animal, path } => {
            let changed = db.update_record(&RecordingFileUpdate {
                animal,
                video_file_path: Some(path),
                reviewed: None,
            })?;
            println!("Updated {} file(s)", changed);
        }

        Command::EditStatus { animal, file, start, status } => {
            let changed = db.set_event_edit_status(&EventKey::new(animal, &file, start), status)?;
            println!("Updated {} event(s)", changed);
        }

        Command::Move { from, animal } => {
            let moved = db.move_recording_files(from, &animal)?;
            if moved == 0 {
                println!("No files of {} in {}.", animal, from);
            } else {
                println!("Moved {} file(s) of {} from {} to {}", moved, animal, from, from.other());
            }
        }

        Command::Files { animal, unreviewed } => {
            if unreviewed {
                let files = db.find_unreviewed_files(&animal)?;
                if json {
                    print_json(&files);
                } else {
                    print_files(files.iter().map(|f| (&f.file_name, f.chan_idx, &f.file_start, None)));
                }
            } else {
                let files = db.get_files_for_animal(&animal)?;
                if json {
                    print_json(&files);
                } else {
                    print_files(files.iter().map(|f| (&f.file_name, f.chan_idx, &f.file_start, Some(f.reviewed))));
                }
            }
        }

        Command::Channels { file } => {
            let rows = db.get_channels_for_file(&file)?;
            if json {
                print_json(&rows);
            } else if rows.is_empty() {
                println!("No channels found.");
            } else {
                println!("{:<6} {:<20} {}", "IDX", "ANIMAL", "PATH");
                println!("{}", "-".repeat(60));
                for r in rows {
                    println!(
                        "{:<6} {:<20} {}",
                        r.chan_idx.map(|i| i.to_string()).unwrap_or_default(),
                        r.animal,
                        r.file_path.unwrap_or_default()
                    );
                }
            }
        }

        Command::Events { animal, file } => {
            let events = match file {
                Some(f) => db.find_events_in_file(&animal, &f)?,
                None => db.get_events_for_animal(&animal)?,
            };
            if json {
                print_json(&events);
            } else if events.is_empty() {
                println!("No events found.");
            } else {
                println!("{:<24} {:>10} {:>10} {:<7} {:<10} {}", "FILE", "START", "END", "RACINE", "FOUND", "TYPE");
                println!("{}", "-".repeat(80));
                for e in events {
                    println!(
                        "{:<24} {:>10.2} {:>10} {:<7} {:<10} {}",
                        truncate(&e.filename, 24),
                        e.event_start,
                        e.event_end.map(|v| format!("{:.2}", v)).unwrap_or_default(),
                        e.racine_score.map(|v| v.to_string()).unwrap_or_default(),
                        e.how_found.unwrap_or_default(),
                        e.event_type.unwrap_or_default()
                    );
                }
            }
        }

        Command::Distinct { table, column } => {
            let mut values = db.list_distinct_values(table, &column)?;
            values.sort();
            if json {
                print_json(&values);
            } else {
                for v in values {
                    println!("{}", v);
                }
            }
        }

        Command::ChannelMap => {
            let map = db.build_channel_animal_map()?;
            if json {
                print_json(&map);
            } else if map.is_empty() {
                println!("No channels mapped.");
            } else {
                for (channel, animal) in map {
                    println!("{:<16} {}", channel, animal);
                }
            }
        }

        Command::Backup { output } => {
            let db_path = db.path().to_path_buf();
            drop(db);

            let backup_path = output.unwrap_or_else(|| {
                let timestamp = Local::now().format("%Y%m%d_%H%M%S");
                PathBuf::from(format!("eegdb_backup_{}.db", timestamp))
            });

            let bytes = std::fs::copy(&db_path, &backup_path).map_err(DbError::Io)?;
            println!("Backup created: {} ({} bytes)", backup_path.display(), bytes);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn report_removal(removed: bool, what: &str) {
    if removed {
        println!("Removed {}", what);
    } else {
        println!("Nothing found for {}.", what);
    }
}

fn print_files<'a>(
    files: impl Iterator<Item = (&'a String, Option<i32>, &'a Option<chrono::NaiveDateTime>, Option<bool>)>,
) {
    let mut files = files.peekable();
    if files.peek().is_none() {
        println!("No files found.");
        return;
    }
    println!("{:<30} {:<5} {:<20} {}", "FILE", "IDX", "START", "REVIEWED");
    println!("{}", "-".repeat(70));
    for (name, idx, start, reviewed) in files {
        println!(
            "{:<30} {:<5} {:<20} {}",
            truncate(name, 30),
            idx.map(|i| i.to_string()).unwrap_or_default(),
            start.map(|s| s.format("%Y-%m-%d %H:%M:%S").to_string()).unwrap_or_default(),
            match reviewed {
                Some(true) => "yes",
                Some(false) => "no",
                None => "-",
            }
        );
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
