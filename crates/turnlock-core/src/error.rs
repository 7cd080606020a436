use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Parsing errors
    #[error("Invalid lock status: {0}")]
    InvalidStatus(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
