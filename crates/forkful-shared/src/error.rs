use thiserror::Error;

/// Rejections produced while validating user input.
///
/// Each variant names the offending form field so the caller can show the
/// message next to it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} must be a number, got '{value}'")]
    NotANumber { field: &'static str, value: String },

    #[error("{field} is out of range: {value}")]
    OutOfRange { field: &'static str, value: String },

    #[error("{field} must be a time of day (HH:MM), got '{value}'")]
    InvalidTime { field: &'static str, value: String },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Missing { field }
            | ValidationError::NotANumber { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidTime { field, .. } => field,
        }
    }
}
