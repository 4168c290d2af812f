//! Error types for KisaanMitra.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Preference error: {0}")]
    Preference(String),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("{0}")]
    Other(String),
}
