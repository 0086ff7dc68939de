/// Why a single fetch failed. Carries the resolved location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("{location}: not found")]
    NotFound { location: String },
    #[error("{location}: HTTP status {status}")]
    Status { location: String, status: u16 },
    #[error("{location}: body is not UTF-8 text")]
    NotText { location: String },
    #[error("{location}: {message}")]
    Io { location: String, message: String },
    #[error("{location}: no fetcher for this origin in this build")]
    Unsupported { location: String },
}

impl FetchError {
    pub fn location(&self) -> &str {
        match self {
            FetchError::NotFound { location }
            | FetchError::Status { location, .. }
            | FetchError::NotText { location }
            | FetchError::Io { location, .. }
            | FetchError::Unsupported { location } => location,
        }
    }
}

/// Errors from shader registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShaderError {
    #[error("failed to load shader {name}: {source}")]
    Fetch { name: String, source: FetchError },
    #[error("shader {0} has not been loaded")]
    NotLoaded(String),
    #[error("shader {0} is already being loaded")]
    Conflict(String),
    #[error("invalid shader name {0:?}")]
    InvalidName(String),
}
