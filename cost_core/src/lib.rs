//! # cost_core - Building Component Cost Estimation Engine
//!
//! `cost_core` prices building components (constructions, HVAC equipment,
//! lighting, renewables) from a line-item costing catalog. It resolves
//! catalog entries, adjusts them for the city being costed, sizes equipment
//! against a required capacity, and rolls every priced line item up into
//! category totals. Inputs and outputs are serde types, so audit reports can
//! be stored and compared run over run.
//!
//! ## Design Philosophy
//!
//! - **Injected state**: the catalog is loaded once and passed by reference;
//!   each audit owns its own [`AuditContext`]
//! - **Fail loudly at load**: every cross-reference in the catalog is checked
//!   before any costing runs
//! - **Degrade gracefully while costing**: a missing localization factor or a
//!   curve lookup out of range is a [`Diagnostic`], never an error
//! - **Rich Errors**: structured error types naming the offending id or path
//!
//! ## Quick Start
//!
//! ```rust
//! use cost_core::catalog::{CatalogItem, CatalogStore};
//! use cost_core::localization::{Locale, LocalizationFactor};
//! use cost_core::{AuditContext, PriceOptions};
//!
//! let mut catalog = CatalogStore::new();
//! catalog.insert_item(CatalogItem::new("AA1", 10.0, 5.0, 0.0))?;
//! catalog.insert_localization_factor(LocalizationFactor::new(
//!     "ON", "Toronto", "AA", 110.0, 90.0, 100.0,
//! ));
//! catalog.validate()?;
//!
//! let mut ctx = AuditContext::new(&catalog, Locale::new("ON", "Toronto"));
//! let cost = ctx.price("AA1", 2.0, PriceOptions::new().tags("envelope"))?;
//! assert!((cost - 31.0).abs() < 1e-9);
//!
//! let report = ctx.finish()?;
//! assert_eq!(report.summary.category("envelope"), Some(31.0));
//! # Ok::<(), cost_core::CostError>(())
//! ```
//!
//! ## Modules
//!
//! - [`catalog`] - Catalog store: cost items and reference tables
//! - [`localization`] - Regional cost factors
//! - [`locations`] - Nearest costed city, province abbreviations
//! - [`interpolation`] - Cost curves
//! - [`sizing`] - Equipment size and unit-count resolution
//! - [`assembler`] - Pricing and the per-audit context
//! - [`constructions`] - Envelope construction costing
//! - [`aggregator`] - Category totals
//! - [`report`] - Audit report document
//! - [`ledger`] - Append-only line-item ledger
//! - [`config`] - TOML configuration
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] / [`diagnostics`] - Fatal errors and recoverable anomalies
//! - [`file_io`] - Atomic report and ledger persistence

pub mod aggregator;
pub mod assembler;
pub mod catalog;
pub mod config;
pub mod constructions;
pub mod diagnostics;
pub mod errors;
pub mod file_io;
pub mod interpolation;
pub mod ledger;
pub mod localization;
pub mod locations;
pub mod report;
pub mod sizing;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use assembler::{AuditContext, ComponentRequest, PriceOptions};
pub use catalog::CatalogStore;
pub use config::{CatalogPaths, CostingConfig};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use errors::{CostError, CostResult};
pub use file_io::{load_ledger, load_report, save_ledger, save_report};
pub use report::AuditReport;
