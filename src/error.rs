use thiserror::Error;

/// Errors produced by the story data model.
///
/// Transport-level failures (connection errors, non-2xx statuses) are not
/// represented here; the HTTP client surfaces those with request context
/// attached. This enum covers only data the model itself refuses to accept.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// A payload or datetime string that cannot be interpreted as a story.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// A field assigned a value outside its accepted set.
    #[error("invalid value for field '{field}': {value:?}")]
    InvalidField { field: &'static str, value: String },
}

impl TrackerError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn invalid_field(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            value: value.into(),
        }
    }
}

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, TrackerError>;
