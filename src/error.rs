//! Error types for codetime

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Reading or writing the stats record or config file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
