use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot find a gilliam.yml file (searched upwards from {0})")]
    ProjectRootNotFound(PathBuf),

    #[error("cannot read manifest {path}: {message}")]
    ManifestParse { path: PathBuf, message: String },

    #[error("{0}: bad port specification")]
    InvalidPortSpec(String),

    #[error("{0}: bad scale format")]
    InvalidScale(String),

    #[error("release {0}: no next release number")]
    ReleaseNumberOverflow(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
