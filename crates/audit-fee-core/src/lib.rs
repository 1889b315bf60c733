pub mod amounts;
pub mod engagement;
pub mod error;
pub mod fees;
pub mod format;
pub mod growth;
pub mod types;

#[cfg(feature = "wizard")]
pub mod wizard;

#[cfg(feature = "directory")]
pub mod directory;

pub use error::AuditFeeError;
pub use types::*;

/// Standard result type for all audit-fee operations
pub type AuditFeeResult<T> = Result<T, AuditFeeError>;
