use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KitError {
    #[error("Failed to read stdin: {0}")]
    StdinRead(#[from] io::Error),

    #[error("Failed to parse input JSON: {0}")]
    InputParse(#[from] serde_json::Error),

    #[error("Failed to read {path}: {source}")]
    FileRead { path: PathBuf, source: io::Error },

    #[error("Failed to parse config at {path}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    #[error("Config directory not found")]
    NoConfigDir,

    #[error("Unknown API family: {0}")]
    UnknownFamily(String),

    #[error("Tag lists are not available for the {0} API family")]
    NoTagEndpoint(&'static str),
}
