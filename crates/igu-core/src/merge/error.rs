//! Error types for update-document validation.

/// Why an update document was rejected. Any of these rejects the whole
/// document; nothing from it is applied.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("update document is not a JSON object")]
    NotAnObject,

    /// `name` or `owner` present but different from the stored group.
    #[error("{field} mismatch: group has {expected:?}, update has {found:?}")]
    IdentityMismatch {
        field: &'static str,
        expected: String,
        found: String,
    },

    #[error("{field}: expected {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },

    #[error("{field}: invalid URL {value:?} ({reason})")]
    InvalidUrl {
        field: String,
        value: String,
        reason: String,
    },
}

impl ValidationError {
    pub(super) fn wrong_type(field: impl Into<String>, expected: &'static str) -> Self {
        ValidationError::WrongType {
            field: field.into(),
            expected,
        }
    }

    pub(super) fn invalid_url(
        field: impl Into<String>,
        value: &str,
        reason: impl Into<String>,
    ) -> Self {
        ValidationError::InvalidUrl {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
