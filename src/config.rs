//! Store configuration

use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "eegdb.db";
pub const DEFAULT_POOL_SIZE: u32 = 5;

/// Where the store lives and how many connections to keep open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Filesystem path or `sqlite:///` connection string
    pub database_url: String,
    pub pool_size: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DB_PATH.to_string(),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl StoreConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Self::default()
        }
    }

    pub fn with_pool_size(mut self, pool_size: u32) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    pub fn database_path(&self) -> PathBuf {
        database_path(&self.database_url)
    }
}

/// Resolve a connection string to the SQLite file it names.
///
/// `sqlite:///rel.db` is relative and `sqlite:////abs.db` absolute, as in
/// SQLAlchemy URLs; anything without a scheme is taken as a path.
pub fn database_path(url: &str) -> PathBuf {
    if let Some(rest) = url.strip_prefix("sqlite:///") {
        PathBuf::from(rest)
    } else if let Some(rest) = url.strip_prefix("sqlite://") {
        PathBuf::from(rest)
    } else {
        PathBuf::from(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path() {
        assert_eq!(database_path("data/eeg.db"), PathBuf::from("data/eeg.db"));
    }

    #[test]
    fn test_sqlalchemy_urls() {
        assert_eq!(database_path("sqlite:///eeg.db"), PathBuf::from("eeg.db"));
        assert_eq!(database_path("sqlite:////srv/eeg.db"), PathBuf::from("/srv/eeg.db"));
    }

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.database_path(), PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.pool_size, DEFAULT_POOL_SIZE);
        assert_eq!(StoreConfig::new("x.db").with_pool_size(0).pool_size, 1);
    }
}
