//! # Category Aggregator
//!
//! Reduces a ledger to per-category subtotals and a grand total. Every entry
//! is re-priced from the catalog (nothing cached from pricing time), so a
//! stored ledger can be re-summarized against a different locale.
//!
//! An entry counts toward every category whose name appears among its tags,
//! compared case-insensitively. Categories may therefore overlap and their sum
//! can exceed `grand_total`, which counts each entry exactly once.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::assembler::{line_cost, Multipliers};
use crate::catalog::CatalogStore;
use crate::diagnostics::Diagnostics;
use crate::errors::CostResult;
use crate::ledger::{Ledger, Tags};
use crate::localization::Locale;
use crate::report::{round_cents, ReportRow};

/// Categories reported when none are configured
pub const DEFAULT_CATEGORIES: [&str; 6] = [
    "envelope",
    "lighting",
    "heating_cooling",
    "shw",
    "ventilation",
    "renewables",
];

/// Category subtotals plus the grand total
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub categories: BTreeMap<String, f64>,
    pub grand_total: f64,
}

impl CostSummary {
    fn with_categories<S: AsRef<str>>(categories: &[S]) -> Self {
        CostSummary {
            categories: categories
                .iter()
                .map(|c| (c.as_ref().to_string(), 0.0))
                .collect(),
            grand_total: 0.0,
        }
    }

    fn add(&mut self, tags: &Tags, cost: f64) {
        for (category, total) in self.categories.iter_mut() {
            if tags.contains(category) {
                *total += cost;
            }
        }
        self.grand_total += cost;
    }

    pub fn category(&self, name: &str) -> Option<f64> {
        self.categories.get(name).copied()
    }

    /// Copy rounded to cents for presentation
    pub fn rounded(&self) -> Self {
        CostSummary {
            categories: self
                .categories
                .iter()
                .map(|(k, v)| (k.clone(), round_cents(*v)))
                .collect(),
            grand_total: round_cents(self.grand_total),
        }
    }
}

/// Summarize a ledger at its own locale
pub fn summarize<S: AsRef<str>>(
    ledger: &Ledger,
    catalog: &CatalogStore,
    categories: &[S],
    diagnostics: &mut Diagnostics,
) -> CostResult<CostSummary> {
    summarize_at(ledger, catalog, ledger.locale(), categories, diagnostics)
}

/// Summarize a ledger at an overriding locale.
///
/// A ledger entry whose catalog id is unknown is fatal; a localization miss
/// substitutes neutral factors and records a diagnostic.
pub fn summarize_at<S: AsRef<str>>(
    ledger: &Ledger,
    catalog: &CatalogStore,
    locale: &Locale,
    categories: &[S],
    diagnostics: &mut Diagnostics,
) -> CostResult<CostSummary> {
    let mut summary = CostSummary::with_categories(categories);
    for entry in ledger.entries() {
        let item = catalog.get_catalog_item(&entry.catalog_id)?;
        let factors = catalog.localization().resolve(locale, &item.id, diagnostics);
        let cost = line_cost(item, &factors, Multipliers::of(entry), entry.quantity);
        summary.add(&entry.tags, cost);
    }
    Ok(summary)
}

/// Total report rows (costs computed outside the ledger, e.g. interpolated
/// envelope surfaces) by the same tag-intersection rule
pub fn summarize_rows<S: AsRef<str>>(rows: &[ReportRow], categories: &[S]) -> CostSummary {
    let mut summary = CostSummary::with_categories(categories);
    for row in rows {
        summary.add(&row.tags, row.cost);
    }
    summary
}
