//! # Audit Report
//!
//! The document an audit run produces: rounded category totals, the full
//! ordered ledger, per-component report rows with their notes, and every
//! diagnostic recorded along the way. Reports are plain serde data so they
//! can be stored and diffed against a later run.
//!
//! ## Rounding
//!
//! Totals are accumulated at full precision and rounded to cents only here,
//! when the report is built. Comparing two reports compares those rounded
//! figures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregator::CostSummary;
use crate::diagnostics::Diagnostics;
use crate::ledger::{CostedLineItem, Tags};
use crate::localization::Locale;

/// Current report schema version
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Round to two decimal places
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A per-component row in the report.
///
/// Used for costs that are not single catalog line items, such as an
/// envelope surface priced off an interpolated cost curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub cost: f64,
    /// Explanation attached when the cost is extrapolated or missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub tags: Tags,
}

impl ReportRow {
    pub fn new(
        name: impl Into<String>,
        quantity: f64,
        unit: impl Into<String>,
        cost: f64,
        tags: impl Into<Tags>,
    ) -> Self {
        ReportRow {
            name: name.into(),
            quantity,
            unit: unit.into(),
            cost,
            note: None,
            tags: tags.into(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Who, where and when
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Schema version for compatibility checks
    pub version: String,
    pub audit_id: Uuid,
    pub created: DateTime<Utc>,
    pub locale: Locale,
}

/// Final output of one audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub meta: ReportMetadata,
    /// Ledger totals by category, rounded to cents
    pub summary: CostSummary,
    /// Report-row totals by category, rounded to cents
    pub component_totals: CostSummary,
    pub ledger: Vec<CostedLineItem>,
    pub rows: Vec<ReportRow>,
    /// Always present, possibly empty
    pub diagnostics: Diagnostics,
}

impl AuditReport {
    /// Sum of the ledger grand total and the report-row grand total
    pub fn total_cost(&self) -> f64 {
        round_cents(self.summary.grand_total + self.component_totals.grand_total)
    }

    /// Differences against an expected report: rounded totals, ledger
    /// entries, report rows and their notes, and diagnostics.
    ///
    /// Metadata (ids, timestamps) is ignored. Numbers are compared to the
    /// cent. An empty result means the two reports agree.
    pub fn differences(&self, expected: &AuditReport) -> Vec<String> {
        let mut diffs = Vec::new();
        compare_summary("summary", &self.summary, &expected.summary, &mut diffs);
        compare_summary(
            "component_totals",
            &self.component_totals,
            &expected.component_totals,
            &mut diffs,
        );
        compare_ledger(&self.ledger, &expected.ledger, &mut diffs);
        compare_rows(&self.rows, &expected.rows, &mut diffs);

        let render = |d: &Diagnostics| -> Vec<String> {
            d.entries().iter().map(|e| e.to_string()).collect()
        };
        let actual_diags = render(&self.diagnostics);
        let expected_diags = render(&expected.diagnostics);
        for missing in expected_diags.iter().filter(|d| !actual_diags.contains(d)) {
            diffs.push(format!("diagnostics: missing {missing}"));
        }
        for extra in actual_diags.iter().filter(|d| !expected_diags.contains(d)) {
            diffs.push(format!("diagnostics: not expected {extra}"));
        }
        diffs
    }

    /// Whether this report's rounded totals equal the expected report's
    pub fn matches(&self, expected: &AuditReport) -> bool {
        self.differences(expected).is_empty()
    }
}

fn compare_summary(label: &str, actual: &CostSummary, expected: &CostSummary, out: &mut Vec<String>) {
    let same = |a: f64, b: f64| round_cents(a) == round_cents(b);

    if !same(actual.grand_total, expected.grand_total) {
        out.push(format!(
            "{label}.grand_total: {:.2}, expected {:.2}",
            actual.grand_total, expected.grand_total
        ));
    }
    for (category, want) in &expected.categories {
        match actual.categories.get(category) {
            Some(got) if same(*got, *want) => {}
            Some(got) => out.push(format!("{label}.{category}: {got:.2}, expected {want:.2}")),
            None => out.push(format!("{label}.{category}: missing")),
        }
    }
    for category in actual.categories.keys() {
        if !expected.categories.contains_key(category) {
            out.push(format!("{label}.{category}: not expected"));
        }
    }
}

fn compare_ledger(actual: &[CostedLineItem], expected: &[CostedLineItem], out: &mut Vec<String>) {
    if actual.len() != expected.len() {
        out.push(format!(
            "ledger: {} entries, expected {}",
            actual.len(),
            expected.len()
        ));
    }
    let same = |a: f64, b: f64| round_cents(a) == round_cents(b);
    for (i, (got, want)) in actual.iter().zip(expected).enumerate() {
        if got.catalog_id != want.catalog_id {
            out.push(format!("ledger[{i}].id: {}, expected {}", got.catalog_id, want.catalog_id));
            continue;
        }
        let numbers = [
            ("quantity", got.quantity, want.quantity),
            ("material_mult", got.material_mult, want.material_mult),
            ("labour_mult", got.labor_mult, want.labor_mult),
            ("equipment_mult", got.equipment_mult, want.equipment_mult),
        ];
        for (field, a, b) in numbers {
            if !same(a, b) {
                out.push(format!("ledger[{i}].{field}: {a:.2}, expected {b:.2}"));
            }
        }
        if got.tags != want.tags {
            out.push(format!(
                "ledger[{i}].tags: {:?}, expected {:?}",
                got.tags.iter().collect::<Vec<_>>(),
                want.tags.iter().collect::<Vec<_>>()
            ));
        }
    }
}

fn compare_rows(actual: &[ReportRow], expected: &[ReportRow], out: &mut Vec<String>) {
    if actual.len() != expected.len() {
        out.push(format!("rows: {} rows, expected {}", actual.len(), expected.len()));
    }
    for (i, (got, want)) in actual.iter().zip(expected).enumerate() {
        if got.name != want.name {
            out.push(format!("rows[{i}].name: {}, expected {}", got.name, want.name));
            continue;
        }
        if round_cents(got.cost) != round_cents(want.cost) {
            out.push(format!("rows[{i}].cost: {:.2}, expected {:.2}", got.cost, want.cost));
        }
        if got.note != want.note {
            out.push(format!("rows[{i}].note: {:?}, expected {:?}", got.note, want.note));
        }
    }
}
