use thiserror::Error;

/// Failures surfaced by field construction, lookup and reconstruction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("invalid field dimensions: {reason}")]
    InvalidDimensions { reason: String },
    #[error("agent index {index} out of range (field has {len} agents)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("corrupt snapshot at record {record}: {reason}")]
    DataCorruption { record: usize, reason: String },
}

impl FieldError {
    pub(crate) fn dimensions(reason: impl Into<String>) -> Self {
        FieldError::InvalidDimensions {
            reason: reason.into(),
        }
    }

    pub(crate) fn corruption(record: usize, reason: impl Into<String>) -> Self {
        FieldError::DataCorruption {
            record,
            reason: reason.into(),
        }
    }
}
