//! # File I/O Module
//!
//! Saving and loading audit outputs:
//! - **Atomic saves**: write to `.tmp`, sync, rename over the target
//! - **Version validation**: reports carry the schema version they were
//!   written with and are rejected if incompatible
//! - **Strict ledgers**: ledger documents are parsed through the type
//!   contract, never plain deserialization, so hand-edited files cannot
//!   smuggle in a string quantity
//!
//! ## Example
//!
//! ```rust,no_run
//! use cost_core::file_io::{load_report, save_report};
//! # fn demo(report: &cost_core::report::AuditReport) -> cost_core::errors::CostResult<()> {
//! let path = std::path::Path::new("audit.json");
//! save_report(report, path)?;
//! let expected = load_report(path)?;
//! assert!(report.matches(&expected));
//! # Ok(())
//! # }
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::errors::{CostError, CostResult};
use crate::ledger::Ledger;
use crate::report::{AuditReport, SCHEMA_VERSION};

/// Save an audit report as pretty JSON, atomically
pub fn save_report(report: &AuditReport, path: &Path) -> CostResult<()> {
    write_json_atomic(report, path)
}

/// Load an audit report, checking its schema version
pub fn load_report(path: &Path) -> CostResult<AuditReport> {
    let contents = read_file(path)?;
    let report: AuditReport =
        serde_json::from_str(&contents).map_err(|e| CostError::SerializationError {
            reason: format!("Invalid JSON in {}: {}", path.display(), e),
        })?;
    validate_version(&report.meta.version)?;
    Ok(report)
}

/// Save a ledger document, atomically
pub fn save_ledger(ledger: &Ledger, path: &Path) -> CostResult<()> {
    write_json_atomic(&ledger.to_document(), path)
}

/// Load a ledger document through the strict type contract
pub fn load_ledger(path: &Path) -> CostResult<Ledger> {
    let contents = read_file(path)?;
    let value: serde_json::Value =
        serde_json::from_str(&contents).map_err(|e| CostError::SerializationError {
            reason: format!("Invalid JSON in {}: {}", path.display(), e),
        })?;
    Ledger::from_json(&value)
}

fn read_file(path: &Path) -> CostResult<String> {
    fs::read_to_string(path)
        .map_err(|e| CostError::file_error("read", path.display().to_string(), e.to_string()))
}

fn write_json_atomic<T: Serialize>(value: &T, path: &Path) -> CostResult<()> {
    let json = serde_json::to_string_pretty(value)?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name).to_path_buf();

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        CostError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        CostError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    tmp_file.sync_all().map_err(|e| {
        CostError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CostError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    tracing::debug!(path = %path.display(), "wrote {} bytes", json.len());
    Ok(())
}

/// Validate that a file version is compatible with the current schema.
///
/// Major versions must match; under 0.x a newer minor version is rejected.
fn validate_version(file_version: &str) -> CostResult<()> {
    let mismatch = || CostError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };
    let parse = |v: &str| -> Vec<u32> { v.split('.').filter_map(|p| p.parse().ok()).collect() };

    let file_parts = parse(file_version);
    let current_parts = parse(SCHEMA_VERSION);
    let (Some(file_major), Some(current_major)) = (file_parts.first(), current_parts.first()) else {
        return Err(mismatch());
    };
    if file_major != current_major {
        return Err(mismatch());
    }
    if *current_major == 0 {
        if let (Some(file_minor), Some(current_minor)) = (file_parts.get(1), current_parts.get(1)) {
            if file_minor > current_minor {
                return Err(mismatch());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::CostSummary;
    use crate::diagnostics::Diagnostics;
    use crate::ledger::CostedLineItem;
    use crate::localization::Locale;
    use crate::report::ReportMetadata;
    use pretty_assertions::assert_eq;

    fn sample_report() -> AuditReport {
        AuditReport {
            meta: ReportMetadata {
                version: SCHEMA_VERSION.to_string(),
                audit_id: uuid::Uuid::new_v4(),
                created: chrono::Utc::now(),
                locale: Locale::new("ON", "Toronto"),
            },
            summary: CostSummary::default(),
            component_totals: CostSummary::default(),
            ledger: vec![CostedLineItem::new("AA1", 2.0, 1.0, 1.0, 1.0, "envelope").unwrap()],
            rows: Vec::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    #[test]
    fn test_report_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.json");
        let report = sample_report();
        save_report(&report, &path).unwrap();
        let loaded = load_report(&path).unwrap();
        assert_eq!(loaded, report);
    }

    #[test]
    fn test_atomic_save_leaves_no_tmp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.json");
        save_report(&sample_report(), &path).unwrap();
        assert!(path.exists());
        assert!(!dir.path().join("audit.json.tmp").exists());
    }

    #[test]
    fn test_incompatible_report_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.json");
        let mut report = sample_report();
        report.meta.version = "1.0.0".to_string();
        save_report(&report, &path).unwrap();
        let err = load_report(&path).unwrap_err();
        assert_eq!(err.error_code(), "VERSION_MISMATCH");
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.7").is_ok());
        assert!(validate_version("0.0.9").is_ok());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("garbage").is_err());
    }

    #[test]
    fn test_ledger_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let mut ledger = Ledger::new(Locale::new("ON", "Toronto"));
        ledger.append(CostedLineItem::new("AA1", 2.0, 1.0, 1.0, 1.0, "envelope").unwrap());
        save_ledger(&ledger, &path).unwrap();
        assert_eq!(load_ledger(&path).unwrap(), ledger);
    }

    #[test]
    fn test_load_ledger_rejects_string_quantity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        fs::write(
            &path,
            r#"{"province_state":"ON","city":"Toronto","items":[{"id":"AA1","quantity":"2"}]}"#,
        )
        .unwrap();
        let err = load_ledger(&path).unwrap_err();
        assert_eq!(err.error_code(), "TYPE_CONTRACT");
    }

    #[test]
    fn test_missing_file() {
        let err = load_report(Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }
}
