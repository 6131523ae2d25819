//! # Size/Capacity Resolver
//!
//! Turns a required capacity into catalog equipment: which sized row to buy
//! and how many of it. When no single unit in a family is large enough, the
//! requirement is split across identical units.
//!
//! ## Modes
//!
//! | Mode | Rule |
//! |------|------|
//! | no size | first row of the family, one unit |
//! | [`SizeMatch::Exact`] | size equal at one decimal, miss is fatal |
//! | [`SizeMatch::Minimum`] | smallest size `>=` request, else split |
//! | [`resolve_dual`](SizeResolver::resolve_dual) | connections and capacity both satisfied, optional remainder unit |
//! | [`resolve_with_ceiling`](SizeResolver::resolve_with_ceiling) | split against the largest unit under a size cap |
//!
//! ## Splitting
//!
//! With `max_size` the largest unit, the unit count is
//! `floor(requested / max_size) + 1`. The `+ 1` is applied even when the
//! request is an exact multiple: 200 kW against a 100 kW maximum gives three
//! units. Each unit is then the smallest row covering `requested / count`.
//!
//! No selection ever yields a unit smaller than required on a constrained
//! axis, and every multiplier is at least 1.

use serde::Serialize;

use crate::catalog::{CatalogStore, EquipmentRow};
use crate::config::CatalogTable;
use crate::errors::{CostError, CostResult};

/// How a requested size is matched against a family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SizeMatch {
    /// The row's size must equal the request at one decimal place
    Exact,
    /// The smallest row at least as large as the request
    #[default]
    Minimum,
}

/// A resolved row and how many identical units to buy
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquipmentSelection<'a> {
    pub row: &'a EquipmentRow,
    pub multiplier: u32,
}

/// The unit covering what `multiplier` main units leave over
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RemainderSelection<'a> {
    pub row: &'a EquipmentRow,
    /// Connections still uncovered by the main units
    pub connections: f64,
    /// Capacity still uncovered by the main units
    pub capacity: f64,
}

/// Result of a dual-constraint (connections + capacity) resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DualSelection<'a> {
    pub main: &'a EquipmentRow,
    pub multiplier: u32,
    pub remainder: Option<RemainderSelection<'a>>,
}

impl DualSelection<'_> {
    /// Units bought, remainder included
    pub fn unit_count(&self) -> u32 {
        self.multiplier + u32::from(self.remainder.is_some())
    }
}

/// Resolves sizes against an injected catalog
#[derive(Debug, Clone, Copy)]
pub struct SizeResolver<'a> {
    catalog: &'a CatalogStore,
}

impl<'a> SizeResolver<'a> {
    pub fn new(catalog: &'a CatalogStore) -> Self {
        SizeResolver { catalog }
    }

    fn family_rows(&self, family: &str) -> CostResult<Vec<&'a EquipmentRow>> {
        let rows = self.catalog.equipment_family(family);
        if rows.is_empty() {
            return Err(no_rows(family));
        }
        Ok(rows)
    }

    /// Resolve a family and optional size to a row and unit count.
    pub fn resolve_equipment(
        &self,
        family: &str,
        size: Option<f64>,
        mode: SizeMatch,
    ) -> CostResult<EquipmentSelection<'a>> {
        let rows = self.family_rows(family)?;
        let Some(size) = size else {
            return Ok(EquipmentSelection {
                row: rows[0],
                multiplier: 1,
            });
        };
        check_size("size", size)?;

        match mode {
            SizeMatch::Exact => {
                let wanted = round1(size);
                rows.iter()
                    .find(|r| r.size.map(round1) == Some(wanted))
                    .map(|row| EquipmentSelection { row, multiplier: 1 })
                    .ok_or_else(|| {
                        CostError::reference_not_found(
                            CatalogTable::Equipment.name(),
                            format!("'{family}' with size {size}"),
                        )
                    })
            }
            SizeMatch::Minimum => {
                if let Some(row) = smallest_at_least(&rows, size) {
                    return Ok(EquipmentSelection { row, multiplier: 1 });
                }
                let multiplier = multiplier_for(&rows, family, size)?;
                let target = size / f64::from(multiplier);
                let row = smallest_at_least(&rows, target).ok_or_else(|| {
                    CostError::reference_not_found(
                        CatalogTable::Equipment.name(),
                        format!("'{family}' unit of at least {target}"),
                    )
                })?;
                tracing::debug!(family, size, multiplier, "split requirement across units");
                Ok(EquipmentSelection { row, multiplier })
            }
        }
    }

    /// Number of largest units needed: `floor(size / max_size) + 1`
    pub fn multiplier(&self, family: &str, size: f64) -> CostResult<u32> {
        check_size("size", size)?;
        let rows = self.family_rows(family)?;
        multiplier_for(&rows, family, size)
    }

    /// The row whose size is nearest the request
    pub fn closest_size(&self, family: &str, size: f64) -> CostResult<&'a EquipmentRow> {
        check_size("size", size)?;
        let rows = self.family_rows(family)?;
        rows.into_iter()
            .filter(|r| r.size.is_some())
            .min_by(|a, b| {
                let da = (a.size.unwrap_or_default() - size).abs();
                let db = (b.size.unwrap_or_default() - size).abs();
                da.total_cmp(&db)
            })
            .ok_or_else(|| {
                CostError::reference_not_found(
                    CatalogTable::Equipment.name(),
                    format!("sized unit in '{family}'"),
                )
            })
    }

    /// Split a capacity across units no larger than `max_unit_size`.
    ///
    /// Unlike the minimum rule, a whole-number ratio does not add a unit:
    /// 600 against a 300 ceiling is two 300 units.
    pub fn resolve_with_ceiling(
        &self,
        family: &str,
        capacity: f64,
        max_unit_size: f64,
    ) -> CostResult<EquipmentSelection<'a>> {
        check_size("capacity", capacity)?;
        let rows = self.family_rows(family)?;

        let largest = rows
            .iter()
            .copied()
            .filter(|r| r.size.is_some_and(|s| s <= max_unit_size))
            .max_by(|a, b| size_of(a).total_cmp(&size_of(b)))
            .ok_or_else(|| {
                CostError::invalid_input(
                    "max_unit_size",
                    max_unit_size.to_string(),
                    format!("No '{family}' unit is at or below the size ceiling"),
                )
            })?;
        let max_size = size_of(largest);
        if max_size <= 0.0 {
            return Err(CostError::validation_failed(
                CatalogTable::Equipment.name(),
                family,
                "Largest unit under the ceiling has no capacity",
            ));
        }

        let ratio = capacity / max_size;
        let units = if ratio > ratio.floor() {
            ratio.floor() + 1.0
        } else {
            ratio.round()
        };
        let multiplier = checked_units("capacity", capacity, units)?;

        let per_unit = capacity / f64::from(multiplier);
        let row = smallest_at_least(&rows, per_unit).unwrap_or(largest);
        Ok(EquipmentSelection { row, multiplier })
    }

    /// Resolve against two constraints at once: `connections` (the numeric
    /// `Fuel` column) and `capacity` (the `Size` column).
    ///
    /// A single unit meeting both is preferred. Otherwise the connection
    /// requirement is split first, then capacity per connection group. When
    /// more than one unit results, the last unit is replaced by the smallest
    /// "remainder" unit covering what the others leave uncovered on both axes.
    pub fn resolve_dual(
        &self,
        family: &str,
        connections: f64,
        capacity: f64,
    ) -> CostResult<DualSelection<'a>> {
        check_size("connections", connections)?;
        check_size("capacity", capacity)?;
        let rows = self.family_rows(family)?;

        let con_ok: Vec<&EquipmentRow> = rows
            .iter()
            .copied()
            .filter(|r| conn_of(r) >= connections)
            .collect();

        if let Some(main) = smallest_by_size(con_ok.iter().copied().filter(|r| size_of(r) >= capacity)) {
            return Ok(DualSelection {
                main,
                multiplier: 1,
                remainder: None,
            });
        }

        // Split on connections first
        let (con_loops, candidates) = if con_ok.is_empty() {
            let widest_row = largest_by(&rows, conn_of).ok_or_else(|| no_rows(family))?;
            let widest = conn_of(widest_row);
            if widest <= 0.0 {
                return Err(CostError::validation_failed(
                    CatalogTable::Equipment.name(),
                    family,
                    "No unit lists a positive connection count",
                ));
            }
            let loops = staged_ceil(connections, widest);
            let per_loop = connections / loops;
            let mut candidates: Vec<&EquipmentRow> = rows
                .iter()
                .copied()
                .filter(|r| conn_of(r) >= per_loop)
                .collect();
            if candidates.is_empty() {
                candidates.push(widest_row);
            }
            (loops, candidates)
        } else {
            let biggest = largest_by(&con_ok, size_of).ok_or_else(|| no_rows(family))?;
            (1.0, vec![biggest])
        };

        // Then capacity within each connection group
        let cap_per_loop = capacity / con_loops;
        let fitting: Vec<&EquipmentRow> = candidates
            .iter()
            .copied()
            .filter(|r| size_of(r) >= cap_per_loop)
            .collect();

        let (total, main) = if let Some(main) = smallest_by_size(fitting.into_iter()) {
            (con_loops, main)
        } else {
            let largest = largest_by(&candidates, size_of).ok_or_else(|| no_rows(family))?;
            if size_of(largest) <= 0.0 {
                return Err(CostError::validation_failed(
                    CatalogTable::Equipment.name(),
                    family,
                    "No unit lists a positive capacity",
                ));
            }
            let cap_loops = staged_ceil(cap_per_loop, size_of(largest));
            let total = con_loops * cap_loops;
            let per_unit_cap = capacity / total;
            let per_unit_con = connections / total;
            let main = smallest_by_size(
                rows.iter()
                    .copied()
                    .filter(|r| size_of(r) >= per_unit_cap && conn_of(r) >= per_unit_con),
            )
            .unwrap_or(largest);
            (total, main)
        };

        let mut multiplier = checked_units("capacity", capacity, total)?;
        let mut remainder = None;
        if multiplier > 1 {
            let full = f64::from(multiplier - 1);
            let left_con = (connections - full * conn_of(main)).max(0.0);
            let left_cap = (capacity - full * size_of(main)).max(0.0);
            if left_con > 0.0 || left_cap > 0.0 {
                remainder = rows
                    .iter()
                    .copied()
                    .filter(|r| conn_of(r) >= left_con && size_of(r) >= left_cap)
                    .min_by(|a, b| {
                        conn_of(a)
                            .total_cmp(&conn_of(b))
                            .then(size_of(a).total_cmp(&size_of(b)))
                    })
                    .map(|row| RemainderSelection {
                        row,
                        connections: left_con,
                        capacity: left_cap,
                    });
                if remainder.is_some() {
                    multiplier -= 1;
                }
            }
        }

        Ok(DualSelection {
            main,
            multiplier,
            remainder,
        })
    }
}

fn check_size(field: &str, value: f64) -> CostResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(CostError::invalid_input(
            field,
            value.to_string(),
            "Must be a finite, non-negative number",
        ));
    }
    Ok(())
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn size_of(row: &EquipmentRow) -> f64 {
    row.size.unwrap_or(0.0)
}

fn conn_of(row: &EquipmentRow) -> f64 {
    row.connections().unwrap_or(0.0)
}

fn smallest_at_least<'a>(rows: &[&'a EquipmentRow], size: f64) -> Option<&'a EquipmentRow> {
    smallest_by_size(rows.iter().copied().filter(|r| r.size.is_some_and(|s| s >= size)))
}

fn smallest_by_size<'a>(rows: impl Iterator<Item = &'a EquipmentRow>) -> Option<&'a EquipmentRow> {
    rows.min_by(|a, b| size_of(a).total_cmp(&size_of(b)))
}

/// First row with the largest key
fn largest_by<'a>(
    rows: &[&'a EquipmentRow],
    key: fn(&EquipmentRow) -> f64,
) -> Option<&'a EquipmentRow> {
    rows.iter()
        .copied()
        .reduce(|best, r| if key(r) > key(best) { r } else { best })
}

fn no_rows(family: &str) -> CostError {
    CostError::reference_not_found(
        CatalogTable::Equipment.name(),
        format!("equipment family '{family}'"),
    )
}

fn multiplier_for(rows: &[&EquipmentRow], family: &str, size: f64) -> CostResult<u32> {
    let max_size = rows.iter().filter_map(|r| r.size).fold(0.0_f64, f64::max);
    if max_size <= 0.0 {
        return Err(CostError::validation_failed(
            CatalogTable::Equipment.name(),
            family,
            "Equipment family has no unit with a positive size",
        ));
    }
    checked_units("size", size, (size / max_size).floor() + 1.0)
}

/// Convert a computed unit count to `u32`, rejecting counts that do not fit.
/// `requested` is the value that produced the count, for the error.
fn checked_units(field: &str, requested: f64, count: f64) -> CostResult<u32> {
    let count = count.max(1.0);
    if !count.is_finite() || count > f64::from(u32::MAX) {
        return Err(CostError::invalid_input(
            field,
            requested.to_string(),
            format!("Requirement needs {count} units, more than can be costed"),
        ));
    }
    Ok(count as u32)
}

/// Unit count for splitting `a` across units of `b`: a remainder above
/// 0.001 rounds up, otherwise the ratio is rounded.
fn staged_ceil(a: f64, b: f64) -> f64 {
    let rem = ((a % b) * 1000.0).round() / 1000.0;
    let count = if rem > 0.0 {
        (a / b).floor() + 1.0
    } else {
        (a / b).round()
    };
    count.max(1.0)
}
