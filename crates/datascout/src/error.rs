//! Custom error types for DataScout.
//!
//! Most failures in this crate degrade instead of propagating (a failed plan
//! request falls back to basic cleaning, a malformed plan leaves the data
//! untouched). The errors below are the ones that do reach a caller: file
//! loading, configuration, exports and chart rendering.
//!
//! Errors are serializable so a front end can show `code` and `message`.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for DataScout.
#[derive(Error, Debug)]
pub enum ScoutError {
    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Caller supplied input that cannot be used (e.g. an empty question).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The file extension is not one DataScout knows how to read.
    #[error("Unsupported file type: '{0}'")]
    UnsupportedFileType(String),

    /// An uploaded file could not be parsed.
    #[error("Failed to read '{path}': {reason}")]
    FileRead { path: String, reason: String },

    /// An operation that needs tabular data was given a text document.
    #[error("No tabular data loaded")]
    NoDataLoaded,

    /// AI client error.
    #[error("AI client error: {0}")]
    AiClientError(String),

    /// Chart rendering failed.
    #[error("Failed to render chart: {0}")]
    RenderFailed(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error (for AI client, only with "ai" feature).
    #[cfg(feature = "ai")]
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ScoutError>,
    },
}

impl ScoutError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ScoutError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Build a [`ScoutError::FileRead`] from a path and any displayable cause.
    pub fn file_read(path: impl AsRef<std::path::Path>, reason: impl std::fmt::Display) -> Self {
        ScoutError::FileRead {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Get error code for front-end handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::UnsupportedFileType(_) => "UNSUPPORTED_FILE_TYPE",
            Self::FileRead { .. } => "FILE_READ_FAILED",
            Self::NoDataLoaded => "NO_DATA_LOADED",
            Self::AiClientError(_) => "AI_CLIENT_ERROR",
            Self::RenderFailed(_) => "RENDER_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            #[cfg(feature = "ai")]
            Self::HttpRequest(_) => "HTTP_REQUEST_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether the user can fix this by picking another file or input.
    pub fn is_user_facing(&self) -> bool {
        match self {
            Self::UnsupportedFileType(_)
            | Self::FileRead { .. }
            | Self::InvalidInput(_)
            | Self::NoDataLoaded
            | Self::ColumnNotFound(_) => true,
            Self::WithContext { source, .. } => source.is_user_facing(),
            _ => false,
        }
    }
}

impl Serialize for ScoutError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ScoutError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for DataScout operations.
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ScoutError::Polars(e).with_context(context))
    }
}
