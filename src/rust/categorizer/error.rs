use std::io;

/// Represents the different types of errors that can occur while training or serving the categorizer.
#[derive(Debug, thiserror::Error)]
pub enum CategorizerError {
    /// The training data is malformed or is missing a required column
    #[error("Data format error: {0}")]
    DataFormat(String),
    /// The training data is too sparse to split or fit
    #[error("Insufficient data: {0}")]
    InsufficientData(String),
    /// A persisted artifact is missing, corrupt, or does not match its pair
    #[error("Artifact load error: {0}")]
    ArtifactLoad(String),
    /// The caller supplied input that cannot be categorized
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Writing artifacts to disk failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl CategorizerError {
    /// Returns true for errors caused by the request rather than by the loaded state.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

impl From<csv::Error> for CategorizerError {
    fn from(err: csv::Error) -> Self {
        CategorizerError::DataFormat(err.to_string())
    }
}
