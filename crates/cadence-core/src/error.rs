//! Validation errors for domain values parsed from untrusted input.

/// A value failed domain validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required text field was empty or whitespace.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// A text field exceeded its maximum length.
    #[error("{field} must not exceed {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// Status string did not name a known lifecycle state.
    #[error("unknown post status: {0:?}")]
    UnknownStatus(String),

    /// Content-type key did not name a known classification.
    #[error("unknown content type: {0:?}")]
    UnknownContentType(String),

    /// Asset type string did not name a known asset kind.
    #[error("unknown asset type: {0:?}")]
    UnknownAssetType(String),
}

/// Reject empty or over-long text.
pub fn require_text(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}
