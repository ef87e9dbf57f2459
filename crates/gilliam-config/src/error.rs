use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot locate home directory")]
    HomeDirNotFound,

    #[error("{path}: cannot read stage config: {message}")]
    StageRead { path: PathBuf, message: String },

    #[error("cannot find address to service registry")]
    MissingServiceRegistry,

    #[error("{path}: malformed credentials file: {message}")]
    AuthParse { path: PathBuf, message: String },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
