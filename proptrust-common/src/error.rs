//! Common error types for PropTrust

use thiserror::Error;

/// Common result type for PropTrust operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage names used in error reporting and audit messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extraction,
    Normalization,
    Translation,
    EntityExtraction,
    Classification,
    RiskScoring,
    Fingerprinting,
    Ledger,
    Persistence,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Extraction => "extraction",
            Stage::Normalization => "normalization",
            Stage::Translation => "translation",
            Stage::EntityExtraction => "entity_extraction",
            Stage::Classification => "classification",
            Stage::RiskScoring => "risk_scoring",
            Stage::Fingerprinting => "fingerprinting",
            Stage::Ledger => "ledger",
            Stage::Persistence => "persistence",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common error types across PropTrust services.
///
/// Every variant maps to a stable error code via [`Error::code`]; the HTTP
/// layer and the audit log rely on those codes staying fixed.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad input: {0}")]
    BadInput(String),

    #[error("External service unavailable ({stage}): {message}")]
    ExternalUnavailable { stage: Stage, message: String },

    #[error("Deadline exceeded in stage {stage} after {timeout_ms} ms")]
    DeadlineExceeded { stage: Stage, timeout_ms: u64 },

    #[error("Ledger rejected operation: {0}")]
    LedgerRejected(String),

    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable error code surfaced to callers and written to the audit log.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Database(_) => "DATABASE_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
            Error::NotFound(_) => "NOT_FOUND",
            Error::BadInput(_) => "BAD_INPUT",
            Error::ExternalUnavailable { .. } => "EXTERNAL_UNAVAILABLE",
            Error::DeadlineExceeded { .. } => "DEADLINE_EXCEEDED",
            Error::LedgerRejected(_) => "LEDGER_REJECTED",
            Error::PersistenceFailed(_) => "PERSISTENCE_FAILED",
            Error::Cancelled => "CANCELLED",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Pipeline stage the error originated in, when known.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::ExternalUnavailable { stage, .. } => Some(*stage),
            Error::DeadlineExceeded { stage, .. } => Some(*stage),
            Error::LedgerRejected(_) => Some(Stage::Ledger),
            Error::PersistenceFailed(_) => Some(Stage::Persistence),
            _ => None,
        }
    }
}
