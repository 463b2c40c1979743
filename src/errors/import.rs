//! Bulk import error types
//!
//! Terminal failures only: anything that stops an import before row-by-row
//! processing begins. Row-scoped problems are collected in the
//! [`ImportReport`](crate::services::import_service::ImportReport) instead.

use thiserror::Error;

use crate::services::import_service::ImportMode;

/// Errors that abort a bulk import before any entity is created.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The archive contains no CSV file
    #[error("Archive contains no CSV data file")]
    NoTabularFile,

    /// The archive contains more than one CSV file
    #[error("Archive contains {0} CSV files; exactly one is required")]
    AmbiguousTabularFile(usize),

    /// The archive could not be opened or an entry could not be read
    #[error("Failed to read archive: {0}")]
    Archive(String),

    /// The CSV file could not be parsed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The CSV column set does not match the declared import mode
    #[error("{0}")]
    ModeMismatch(String),

    /// One or more rows are missing required fields
    #[error("Validation failed:\n{}", .0.join("\n"))]
    ValidationFailed(Vec<String>),

    /// The request did not supply a context id the mode requires
    #[error("Missing required context: {0}")]
    MissingContext(&'static str),

    /// A context id referenced an entity that does not exist
    #[error("{entity} {id} not found")]
    ContextNotFound { entity: &'static str, id: i32 },

    /// Database error outside any row's scope
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl ImportError {
    /// Check if this is a client error (400-series)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ImportError::NoTabularFile
                | ImportError::AmbiguousTabularFile(_)
                | ImportError::Archive(_)
                | ImportError::Csv(_)
                | ImportError::ModeMismatch(_)
                | ImportError::ValidationFailed(_)
                | ImportError::MissingContext(_)
                | ImportError::ContextNotFound { .. }
        )
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            ImportError::NoTabularFile => "NO_TABULAR_FILE",
            ImportError::AmbiguousTabularFile(_) => "AMBIGUOUS_TABULAR_FILE",
            ImportError::Archive(_) => "ARCHIVE_ERROR",
            ImportError::Csv(_) => "CSV_ERROR",
            ImportError::ModeMismatch(_) => "MODE_MISMATCH",
            ImportError::ValidationFailed(_) => "VALIDATION_FAILED",
            ImportError::MissingContext(_) => "MISSING_CONTEXT",
            ImportError::ContextNotFound { .. } => "CONTEXT_NOT_FOUND",
            ImportError::Database(_) => "DATABASE_ERROR",
        }
    }

    pub fn mode_mismatch(declared: ImportMode, detected: Option<ImportMode>) -> Self {
        let message = match detected {
            Some(actual) => format!(
                "File does not match '{}' import; its columns look like a '{}' import",
                declared, actual
            ),
            None => format!(
                "File does not match '{}' import and no other mode fits its columns",
                declared
            ),
        };
        ImportError::ModeMismatch(message)
    }
}
