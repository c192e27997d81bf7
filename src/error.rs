use thiserror::Error;

/// Application-level error carrying the process exit code.
///
/// Exit codes: `2` for bad input or configuration, `4` for runtime failures
/// (network, unexpected upstream shape) in commands that need a source to succeed.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failure inside a source adapter.
///
/// Adapters return these to the aggregator, which turns them into an empty
/// contribution. Nothing in this enum is fatal to a render.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("unexpected data shape: {0}")]
    Shape(String),

    #[error("could not read workbook: {0}")]
    Workbook(String),
}

impl SourceError {
    pub fn shape(message: impl Into<String>) -> Self {
        Self::Shape(message.into())
    }

    /// `true` for failures that happened before any body was received.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Status { .. })
    }
}

impl From<SourceError> for AppError {
    fn from(err: SourceError) -> Self {
        AppError::new(4, err.to_string())
    }
}
