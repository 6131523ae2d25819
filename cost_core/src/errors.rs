//! # Error Types
//!
//! Fatal error taxonomy for cost_core. Anything in here aborts the audit that
//! raised it. Recoverable anomalies (localization misses, curve lookups out of
//! range) are never errors; they are collected as
//! [`Diagnostic`](crate::diagnostics::Diagnostic)s instead.
//!
//! ## Example
//!
//! ```rust
//! use cost_core::errors::{CostError, CostResult};
//!
//! fn validate_quantity(quantity: f64) -> CostResult<()> {
//!     if !quantity.is_finite() {
//!         return Err(CostError::type_contract(
//!             "quantity",
//!             quantity.to_string(),
//!             "Quantity must be a finite number",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for cost_core operations
pub type CostResult<T> = Result<T, CostError>;

/// Structured error type for catalog loading and costing operations.
///
/// Each variant names the offending id, table or path so the root cause can be
/// surfaced without digging through logs.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CostError {
    /// A declared catalog table file does not exist
    #[error("Missing catalog table: could not find '{path}'")]
    MissingTable { path: String },

    /// A ledger entry or reference row points at an id absent from the cost table
    #[error("Catalog item not found: no costing information available for id '{id}'")]
    CatalogItemNotFound { id: String },

    /// A lookup into a reference table (family, assembly, construction) found nothing
    #[error("Reference not found in '{table}': {key}")]
    ReferenceNotFound { table: String, key: String },

    /// Catalog-internal consistency check failed at load time
    #[error("Catalog validation failed in '{table}' row {row}: {reason}")]
    ValidationFailed {
        table: String,
        row: String,
        reason: String,
    },

    /// Malformed argument passed into the ledger (wrong type or shape)
    #[error("Type contract violated for '{field}': {value} - {reason}")]
    TypeContract {
        field: String,
        value: String,
        reason: String,
    },

    /// A costing request is invalid (non-positive size, unknown mode, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// Configuration file could not be parsed
    #[error("Configuration error in '{path}': {reason}")]
    ConfigError { path: String, reason: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },
}

impl CostError {
    /// Create a MissingTable error
    pub fn missing_table(path: impl Into<String>) -> Self {
        CostError::MissingTable { path: path.into() }
    }

    /// Create a CatalogItemNotFound error
    pub fn catalog_item_not_found(id: impl Into<String>) -> Self {
        CostError::CatalogItemNotFound { id: id.into() }
    }

    /// Create a ReferenceNotFound error
    pub fn reference_not_found(table: impl Into<String>, key: impl Into<String>) -> Self {
        CostError::ReferenceNotFound {
            table: table.into(),
            key: key.into(),
        }
    }

    /// Create a ValidationFailed error
    pub fn validation_failed(
        table: impl Into<String>,
        row: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CostError::ValidationFailed {
            table: table.into(),
            row: row.into(),
            reason: reason.into(),
        }
    }

    /// Create a TypeContract error
    pub fn type_contract(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CostError::TypeContract {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CostError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(
        operation: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CostError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error was detected while loading the catalog, before any
    /// costing call could run
    pub fn is_load_time(&self) -> bool {
        matches!(
            self,
            CostError::MissingTable { .. }
                | CostError::ValidationFailed { .. }
                | CostError::ConfigError { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CostError::MissingTable { .. } => "MISSING_TABLE",
            CostError::CatalogItemNotFound { .. } => "CATALOG_ITEM_NOT_FOUND",
            CostError::ReferenceNotFound { .. } => "REFERENCE_NOT_FOUND",
            CostError::ValidationFailed { .. } => "VALIDATION_FAILED",
            CostError::TypeContract { .. } => "TYPE_CONTRACT",
            CostError::InvalidInput { .. } => "INVALID_INPUT",
            CostError::FileError { .. } => "FILE_ERROR",
            CostError::ConfigError { .. } => "CONFIG_ERROR",
            CostError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CostError::VersionMismatch { .. } => "VERSION_MISMATCH",
        }
    }
}

impl From<serde_json::Error> for CostError {
    fn from(e: serde_json::Error) -> Self {
        CostError::SerializationError {
            reason: e.to_string(),
        }
    }
}
