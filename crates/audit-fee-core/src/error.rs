use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditFeeError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for AuditFeeError {
    fn from(e: serde_json::Error) -> Self {
        AuditFeeError::SerializationError(e.to_string())
    }
}

impl From<std::io::Error> for AuditFeeError {
    fn from(e: std::io::Error) -> Self {
        AuditFeeError::Io(e.to_string())
    }
}
