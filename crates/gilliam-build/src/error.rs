use gilliam_api::ApiError;
use gilliam_config::ConfigError;
use gilliam_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("[{service}] build failed: {exit_code}")]
    BuildFailed { service: String, exit_code: i64 },

    #[error("must authenticate with {registry}")]
    AuthRequired { registry: String },

    #[error("cannot detect service type for {service}")]
    UnknownServiceType { service: String },

    #[error("{service}: unknown service type '{kind}'")]
    UnknownVariant { service: String, kind: String },

    #[error("[{service}] push failed: {message}")]
    PushFailed { service: String, message: String },

    #[error("gave up creating a release after {attempts} conflicting attempts")]
    ConflictRetriesExhausted { attempts: u32 },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// 対処方法のヒント（あれば）
    pub fn hint(&self) -> Option<String> {
        match self {
            BuildError::AuthRequired { registry } => Some(format!(
                "run `gilliam auth -r {registry}` to store credentials, or build with --no-push"
            )),
            BuildError::UnknownServiceType { .. } => {
                Some("give the service a `type` or a `script` in gilliam.yml".to_string())
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
