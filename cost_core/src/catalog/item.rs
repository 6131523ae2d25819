//! Line-item cost records.
//!
//! A [`CatalogItem`] is one row of the master cost table: baseline material,
//! labour and equipment unit costs for a catalog id. Costs are national
//! baselines; localization factors adjust them per city at pricing time.

use serde::{Deserialize, Serialize};

use crate::errors::{CostError, CostResult};

/// One priced line item from the cost table.
///
/// Ids are case-insensitive; the store keeps them upper-cased.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Catalog id (e.g. "AA1"); the first two characters select the
    /// localization code prefix
    pub id: String,
    /// Baseline material cost per unit
    pub material_op_cost: f64,
    /// Baseline labour cost per unit
    pub labor_op_cost: f64,
    /// Baseline equipment cost per unit
    pub equipment_op_cost: f64,
    /// Default material multiplier applied when a caller does not give one
    pub material_mult: f64,
    /// Default labour multiplier applied when a caller does not give one
    pub labor_mult: f64,
}

impl CatalogItem {
    /// Create an item with neutral multipliers
    pub fn new(id: impl Into<String>, material: f64, labor: f64, equipment: f64) -> Self {
        CatalogItem {
            id: id.into().to_uppercase(),
            material_op_cost: material,
            labor_op_cost: labor,
            equipment_op_cost: equipment,
            material_mult: 1.0,
            labor_mult: 1.0,
        }
    }

    /// Override the default multipliers (builder pattern)
    pub fn with_multipliers(mut self, material_mult: f64, labor_mult: f64) -> Self {
        self.material_mult = material_mult;
        self.labor_mult = labor_mult;
        self
    }

    /// Two-character localization code prefix of this item's id
    pub fn code_prefix(&self) -> String {
        code_prefix(&self.id)
    }
}

/// First two characters of an id, upper-cased
pub fn code_prefix(id: &str) -> String {
    id.chars().take(2).collect::<String>().to_uppercase()
}

/// Raw row of `costs.csv`. Blank cost cells deserialize to `None`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CostRecord {
    pub id: String,
    #[serde(default)]
    pub material_op_cost: Option<f64>,
    #[serde(default)]
    pub labor_op_cost: Option<f64>,
    #[serde(default)]
    pub equipment_op_cost: Option<f64>,
    #[serde(default)]
    pub material_mult: Option<f64>,
    #[serde(default)]
    pub labor_mult: Option<f64>,
}

impl CostRecord {
    /// Validate and convert into a [`CatalogItem`].
    ///
    /// A row with neither a material nor a labour cost carries no price at
    /// all and is rejected.
    pub fn into_item(self, row: usize) -> CostResult<CatalogItem> {
        let id = self.id.trim().to_uppercase();
        if id.is_empty() {
            return Err(CostError::validation_failed(
                "costs",
                row.to_string(),
                "Cost row has an empty id",
            ));
        }
        if self.material_op_cost.is_none() && self.labor_op_cost.is_none() {
            return Err(CostError::validation_failed(
                "costs",
                row.to_string(),
                format!("Costing information for id '{id}' has no material or labour cost"),
            ));
        }

        let non_zero_or_one = |m: Option<f64>| match m {
            Some(v) if v != 0.0 => v,
            _ => 1.0,
        };

        Ok(CatalogItem {
            id,
            material_op_cost: self.material_op_cost.unwrap_or(0.0),
            labor_op_cost: self.labor_op_cost.unwrap_or(0.0),
            equipment_op_cost: self.equipment_op_cost.unwrap_or(0.0),
            material_mult: non_zero_or_one(self.material_mult),
            labor_mult: non_zero_or_one(self.labor_mult),
        })
    }
}
