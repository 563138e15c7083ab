use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegwatchError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] rusqlite_migration::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown province: {0}")]
    UnknownProvince(String),

    #[error("A crawl is already running")]
    AlreadyRunning,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, RegwatchError>;
