//! Typed reference tables.
//!
//! Each reference table has a raw `*Record` mirroring its CSV header (column
//! names as they appear in the costing spreadsheets) and a validated row type
//! the rest of the engine works with. Conversion happens once at load; nothing
//! downstream re-parses strings.

use serde::{Deserialize, Serialize};

use crate::errors::{CostError, CostResult};

// ============================================================================
// Equipment
// ============================================================================

/// One sized piece of equipment in a family (boilers, chillers, pumps, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRow {
    /// Row key referenced by assemblies
    pub material_id: String,
    /// Equipment family the capacity lookup groups by
    pub family: String,
    /// Capacity in the family's unit (kW, L/s, ...); `None` for unsized rows
    pub size: Option<f64>,
    /// Raw `Fuel` cell. Holds a fuel type for heating plant and the number of
    /// connections for branch distributors.
    pub fuel: Option<String>,
    pub unit: String,
    pub description: String,
    /// Foreign key into the cost table
    pub catalog_id: String,
    pub material_mult: f64,
    pub labour_mult: f64,
}

impl EquipmentRow {
    /// Number of connections, when the `Fuel` cell is numeric
    pub fn connections(&self) -> Option<f64> {
        self.fuel.as_deref().and_then(|f| f.trim().parse::<f64>().ok())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EquipmentRecord {
    material_id: String,
    #[serde(rename = "Material")]
    family: String,
    #[serde(rename = "Size", default)]
    size: Option<f64>,
    #[serde(rename = "Fuel", default)]
    fuel: Option<String>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    description: Option<String>,
    id: String,
    #[serde(default)]
    material_mult: Option<f64>,
    #[serde(default)]
    labour_mult: Option<f64>,
}

impl EquipmentRecord {
    pub fn into_row(self, row: usize) -> CostResult<EquipmentRow> {
        let material_id = self.material_id.trim().to_uppercase();
        if material_id.is_empty() {
            return Err(CostError::validation_failed(
                "equipment",
                row.to_string(),
                "Equipment row has an empty material_id",
            ));
        }
        if let Some(size) = self.size {
            if size < 0.0 || !size.is_finite() {
                return Err(CostError::validation_failed(
                    "equipment",
                    row.to_string(),
                    format!("Equipment '{material_id}' has invalid size {size}"),
                ));
            }
        }
        let row_out = EquipmentRow {
            material_id,
            family: self.family.trim().to_string(),
            size: self.size,
            fuel: self.fuel.filter(|f| !f.trim().is_empty()),
            unit: self.unit.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            catalog_id: self.id.trim().to_uppercase(),
            material_mult: self.material_mult.unwrap_or(1.0),
            labour_mult: self.labour_mult.unwrap_or(1.0),
        };
        if let Some(c) = row_out.connections() {
            if c < 0.0 || !c.is_finite() {
                return Err(CostError::validation_failed(
                    "equipment",
                    row.to_string(),
                    format!(
                        "Equipment '{}' has invalid connection count {c}",
                        row_out.material_id
                    ),
                ));
            }
        }
        Ok(row_out)
    }
}

// ============================================================================
// Assemblies
// ============================================================================

/// A named bundle of equipment rows priced together (e.g. an air handler:
/// casing, fans, coils, filters).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyRow {
    pub name: String,
    /// `EquipmentRow::material_id`s, parallel to `component_quantities`
    pub component_ids: Vec<String>,
    pub component_quantities: Vec<f64>,
}

impl AssemblyRow {
    /// Iterate `(material_id, quantity)` pairs
    pub fn components(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.component_ids
            .iter()
            .map(String::as_str)
            .zip(self.component_quantities.iter().copied())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AssemblyRecord {
    name: String,
    id_layers: String,
    #[serde(rename = "Id_layers_quantity_multipliers")]
    quantity_multipliers: String,
}

impl AssemblyRecord {
    pub fn into_row(self, row: usize) -> CostResult<AssemblyRow> {
        let name = self.name.trim().to_string();
        let component_ids: Vec<String> = split_list(&self.id_layers)
            .map(str::to_uppercase)
            .collect();
        let component_quantities = split_list(&self.quantity_multipliers)
            .map(|q| {
                q.parse::<f64>().map_err(|_| {
                    CostError::validation_failed(
                        "assemblies",
                        row.to_string(),
                        format!("Assembly '{name}' has non-numeric quantity '{q}'"),
                    )
                })
            })
            .collect::<CostResult<Vec<f64>>>()?;

        if component_ids.len() != component_quantities.len() {
            return Err(CostError::validation_failed(
                "assemblies",
                row.to_string(),
                format!(
                    "Assembly '{}' lists {} components but {} quantity multipliers",
                    name,
                    component_ids.len(),
                    component_quantities.len()
                ),
            ));
        }
        if component_ids.is_empty() {
            return Err(CostError::validation_failed(
                "assemblies",
                row.to_string(),
                format!("Assembly '{name}' has no components"),
            ));
        }

        Ok(AssemblyRow {
            name,
            component_ids,
            component_quantities,
        })
    }
}

// ============================================================================
// Constructions
// ============================================================================

/// One material layer of a construction, pointing at a cost item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionMaterialRow {
    pub material_index: String,
    pub catalog_id: String,
    /// Quantity of the cost item per ft² of construction
    pub quantity: f64,
    pub material_mult: f64,
    pub labour_mult: f64,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ConstructionMaterialRecord {
    materials_id: String,
    id: String,
    #[serde(default)]
    quantity: Option<f64>,
    #[serde(default)]
    material_mult: Option<f64>,
    #[serde(default)]
    labour_mult: Option<f64>,
    #[serde(default)]
    description: Option<String>,
}

impl ConstructionMaterialRecord {
    pub fn into_row(self, row: usize) -> CostResult<ConstructionMaterialRow> {
        let material_index = self.materials_id.trim().to_uppercase();
        if material_index.is_empty() {
            return Err(CostError::validation_failed(
                "construction_materials",
                row.to_string(),
                "Material row has an empty materials_id",
            ));
        }
        Ok(ConstructionMaterialRow {
            material_index,
            catalog_id: self.id.trim().to_uppercase(),
            quantity: self.quantity.unwrap_or(0.0),
            material_mult: self.material_mult.unwrap_or(1.0),
            labour_mult: self.labour_mult.unwrap_or(1.0),
            description: self.description.unwrap_or_default(),
        })
    }
}

/// Opaque constructions are keyed by RSI, glazing by U-value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstructionKind {
    Opaque,
    Glazing,
}

impl std::fmt::Display for ConstructionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstructionKind::Opaque => write!(f, "opaque"),
            ConstructionKind::Glazing => write!(f, "glazing"),
        }
    }
}

/// One construction of a construction type at a given thermal performance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionRow {
    pub construction_type_name: String,
    pub kind: ConstructionKind,
    pub rsi_k_m2_per_w: Option<f64>,
    pub u_w_per_m2_k: Option<f64>,
    /// `ConstructionMaterialRow::material_index`es, outside to inside
    pub material_layers: Vec<String>,
    pub description: String,
}

impl ConstructionRow {
    /// The x coordinate on this construction type's cost curve.
    ///
    /// RSI for opaque constructions, `1/U` for glazing.
    pub fn curve_x(&self) -> Option<f64> {
        match self.kind {
            ConstructionKind::Opaque => self.rsi_k_m2_per_w,
            ConstructionKind::Glazing => self.u_w_per_m2_k.map(|u| 1.0 / u),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ConstructionRecord {
    construction_type_name: String,
    kind: ConstructionKind,
    #[serde(default)]
    rsi_k_m2_per_w: Option<f64>,
    #[serde(default)]
    u_w_per_m2_k: Option<f64>,
    material_id_layers: String,
    #[serde(default)]
    description: Option<String>,
}

impl ConstructionRecord {
    pub fn into_row(self, row: usize) -> CostResult<ConstructionRow> {
        let name = self.construction_type_name.trim().to_string();
        match self.kind {
            ConstructionKind::Opaque if self.rsi_k_m2_per_w.is_none() => {
                return Err(CostError::validation_failed(
                    "constructions",
                    row.to_string(),
                    format!("Opaque construction '{name}' has no rsi_k_m2_per_w"),
                ));
            }
            ConstructionKind::Glazing if !self.u_w_per_m2_k.is_some_and(|u| u > 0.0) => {
                return Err(CostError::validation_failed(
                    "constructions",
                    row.to_string(),
                    format!("Glazing construction '{name}' needs a positive u_w_per_m2_k"),
                ));
            }
            _ => {}
        }
        let material_layers: Vec<String> = split_list(&self.material_id_layers)
            .map(str::to_uppercase)
            .collect();
        if material_layers.is_empty() {
            return Err(CostError::validation_failed(
                "constructions",
                row.to_string(),
                format!("Construction '{name}' has no material layers"),
            ));
        }
        Ok(ConstructionRow {
            construction_type_name: name,
            kind: self.kind,
            rsi_k_m2_per_w: self.rsi_k_m2_per_w,
            u_w_per_m2_k: self.u_w_per_m2_k,
            material_layers,
            description: self.description.unwrap_or_default(),
        })
    }
}

/// Split a comma-separated cell, dropping blanks
fn split_list(cell: &str) -> impl Iterator<Item = &str> {
    cell.split(',').map(str::trim).filter(|s| !s.is_empty())
}
