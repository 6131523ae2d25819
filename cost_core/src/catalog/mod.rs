//! # Catalog Store
//!
//! The costing database: line-item costs keyed by catalog id, plus the
//! reference tables that point into it (equipment families, assemblies,
//! construction layers, localization factors, surveyed locations).
//!
//! A store is built once, either from CSV tables on disk with
//! [`CatalogStore::load`] or in code with the `insert_*` builders followed by
//! [`CatalogStore::validate`], and is read-only afterwards. Every
//! cross-reference is checked before the store is handed out, so costing code
//! can treat a dangling id as impossible rather than as a runtime branch.
//!
//! ## Example
//!
//! ```rust,ignore
//! use cost_core::catalog::CatalogStore;
//! use cost_core::config::CatalogPaths;
//!
//! let store = CatalogStore::load(&CatalogPaths::in_dir("data/costing"))?;
//! let item = store.get_catalog_item("aa1")?; // ids are case-insensitive
//! println!("{} material = {}", item.id, item.material_op_cost);
//! ```

pub mod item;
pub mod reference;

#[cfg(test)]
pub(crate) mod fixtures;

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;

use crate::config::{CatalogPaths, CatalogTable};
use crate::errors::{CostError, CostResult};
use crate::localization::{LocalizationFactor, LocalizationTable};
use crate::locations::Location;

pub use item::CatalogItem;
pub use reference::{
    AssemblyRow, ConstructionKind, ConstructionMaterialRow, ConstructionRow, EquipmentRow,
};

use item::CostRecord;
use reference::{AssemblyRecord, ConstructionMaterialRecord, ConstructionRecord, EquipmentRecord};

/// Immutable costing database shared by every audit in a run.
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    /// Cost items indexed by uppercase id
    items: HashMap<String, CatalogItem>,

    /// Equipment rows in file order (family lookups depend on it)
    equipment: Vec<EquipmentRow>,

    /// Uppercase material_id -> index into `equipment`
    equipment_by_material_id: HashMap<String, usize>,

    /// Uppercase family -> indices into `equipment`
    by_family: HashMap<String, Vec<usize>>,

    /// Assemblies indexed by uppercase name
    assemblies: HashMap<String, AssemblyRow>,

    /// Construction layers indexed by uppercase material index
    construction_materials: HashMap<String, ConstructionMaterialRow>,

    constructions: Vec<ConstructionRow>,

    localization: LocalizationTable,

    locations: Vec<Location>,
}

impl CatalogStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate every catalog table.
    ///
    /// All declared tables must exist; a missing file fails the whole load
    /// with the missing path(s) named. No partial catalog is ever returned.
    pub fn load(paths: &CatalogPaths) -> CostResult<Self> {
        let missing = paths.missing();
        if !missing.is_empty() {
            let names: Vec<String> = missing.iter().map(|p| p.display().to_string()).collect();
            return Err(CostError::missing_table(names.join(", ")));
        }

        let mut store = CatalogStore::new();

        for (row, record) in read_table::<CostRecord>(CatalogTable::Costs, paths)? {
            store.insert_item(record.into_item(row)?)?;
        }
        for (_, factor) in
            read_table::<LocalizationFactor>(CatalogTable::LocalizationFactors, paths)?
        {
            store.insert_localization_factor(factor);
        }
        for (_, location) in read_table::<Location>(CatalogTable::Locations, paths)? {
            store.insert_location(location);
        }
        for (row, record) in read_table::<EquipmentRecord>(CatalogTable::Equipment, paths)? {
            store.insert_equipment(record.into_row(row)?)?;
        }
        for (row, record) in read_table::<AssemblyRecord>(CatalogTable::Assemblies, paths)? {
            store.insert_assembly(record.into_row(row)?)?;
        }
        for (row, record) in
            read_table::<ConstructionMaterialRecord>(CatalogTable::ConstructionMaterials, paths)?
        {
            store.insert_construction_material(record.into_row(row)?)?;
        }
        for (row, record) in
            read_table::<ConstructionRecord>(CatalogTable::Constructions, paths)?
        {
            store.insert_construction(record.into_row(row)?);
        }

        store.validate()?;

        tracing::info!(
            items = store.items.len(),
            equipment = store.equipment.len(),
            assemblies = store.assemblies.len(),
            constructions = store.constructions.len(),
            localization_rows = store.localization.len(),
            locations = store.locations.len(),
            "Loaded cost catalog from {}",
            paths.dir.display()
        );

        Ok(store)
    }

    // ========================================================================
    // Builders
    // ========================================================================

    /// Insert a cost item. Duplicate ids (case-insensitive) are rejected.
    pub fn insert_item(&mut self, mut item: CatalogItem) -> CostResult<()> {
        let key = item.id.to_uppercase();
        if self.items.contains_key(&key) {
            return Err(CostError::validation_failed(
                CatalogTable::Costs.name(),
                key,
                "Duplicate catalog id",
            ));
        }
        item.id = key.clone();
        self.items.insert(key, item);
        Ok(())
    }

    /// Insert an equipment row. Duplicate material ids are rejected.
    pub fn insert_equipment(&mut self, row: EquipmentRow) -> CostResult<()> {
        let key = row.material_id.to_uppercase();
        if self.equipment_by_material_id.contains_key(&key) {
            return Err(CostError::validation_failed(
                CatalogTable::Equipment.name(),
                key,
                "Duplicate equipment material_id",
            ));
        }
        let index = self.equipment.len();
        self.by_family
            .entry(row.family.to_uppercase())
            .or_default()
            .push(index);
        self.equipment_by_material_id.insert(key, index);
        self.equipment.push(row);
        Ok(())
    }

    pub fn insert_assembly(&mut self, row: AssemblyRow) -> CostResult<()> {
        let key = row.name.to_uppercase();
        if self.assemblies.contains_key(&key) {
            return Err(CostError::validation_failed(
                CatalogTable::Assemblies.name(),
                key,
                "Duplicate assembly name",
            ));
        }
        self.assemblies.insert(key, row);
        Ok(())
    }

    pub fn insert_construction_material(&mut self, row: ConstructionMaterialRow) -> CostResult<()> {
        let key = row.material_index.to_uppercase();
        if self.construction_materials.contains_key(&key) {
            return Err(CostError::validation_failed(
                CatalogTable::ConstructionMaterials.name(),
                key,
                "Duplicate materials_id",
            ));
        }
        self.construction_materials.insert(key, row);
        Ok(())
    }

    pub fn insert_construction(&mut self, row: ConstructionRow) {
        self.constructions.push(row);
    }

    pub fn insert_localization_factor(&mut self, factor: LocalizationFactor) {
        self.localization.insert(factor);
    }

    pub fn insert_location(&mut self, location: Location) {
        self.locations.push(location);
    }

    /// Check every cross-reference and family invariant.
    ///
    /// [`load`](Self::load) calls this; stores assembled by hand must call it
    /// before costing.
    pub fn validate(&self) -> CostResult<()> {
        for row in &self.equipment {
            if !self.items.contains_key(&row.catalog_id.to_uppercase()) {
                return Err(CostError::validation_failed(
                    CatalogTable::Equipment.name(),
                    row.material_id.clone(),
                    format!("References unknown catalog id '{}'", row.catalog_id),
                ));
            }
        }

        for (family, indices) in &self.by_family {
            let sizes: Vec<f64> = indices
                .iter()
                .filter_map(|&i| self.equipment[i].size)
                .collect();
            if !sizes.is_empty() && sizes.iter().all(|&s| s <= 0.0) {
                return Err(CostError::validation_failed(
                    CatalogTable::Equipment.name(),
                    family.clone(),
                    "Equipment family has no unit with a positive size",
                ));
            }
        }

        for assembly in self.assemblies.values() {
            for id in &assembly.component_ids {
                if !self.equipment_by_material_id.contains_key(&id.to_uppercase()) {
                    return Err(CostError::validation_failed(
                        CatalogTable::Assemblies.name(),
                        assembly.name.clone(),
                        format!("References unknown equipment material_id '{id}'"),
                    ));
                }
            }
        }

        for material in self.construction_materials.values() {
            if !self.items.contains_key(&material.catalog_id.to_uppercase()) {
                return Err(CostError::validation_failed(
                    CatalogTable::ConstructionMaterials.name(),
                    material.material_index.clone(),
                    format!("References unknown catalog id '{}'", material.catalog_id),
                ));
            }
        }

        for construction in &self.constructions {
            for layer in &construction.material_layers {
                if !self.construction_materials.contains_key(&layer.to_uppercase()) {
                    return Err(CostError::validation_failed(
                        CatalogTable::Constructions.name(),
                        construction.construction_type_name.clone(),
                        format!("References unknown material layer '{layer}'"),
                    ));
                }
            }
        }

        Ok(())
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Look up a cost item by id (case-insensitive)
    pub fn get_catalog_item(&self, id: &str) -> CostResult<&CatalogItem> {
        self.find_item(id)
            .ok_or_else(|| CostError::catalog_item_not_found(id))
    }

    /// Like [`get_catalog_item`](Self::get_catalog_item) but without an error
    pub fn find_item(&self, id: &str) -> Option<&CatalogItem> {
        self.items.get(&id.trim().to_uppercase())
    }

    /// Number of cost items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Rows of an equipment family in file order (family match is case-insensitive)
    pub fn equipment_family(&self, family: &str) -> Vec<&EquipmentRow> {
        self.by_family
            .get(&family.to_uppercase())
            .map(|indices| indices.iter().map(|&i| &self.equipment[i]).collect())
            .unwrap_or_default()
    }

    pub fn has_family(&self, family: &str) -> bool {
        self.by_family.contains_key(&family.to_uppercase())
    }

    pub fn equipment_by_material_id(&self, material_id: &str) -> CostResult<&EquipmentRow> {
        self.equipment_by_material_id
            .get(&material_id.to_uppercase())
            .map(|&i| &self.equipment[i])
            .ok_or_else(|| {
                CostError::reference_not_found(CatalogTable::Equipment.name(), material_id)
            })
    }

    pub fn assembly(&self, name: &str) -> CostResult<&AssemblyRow> {
        self.assemblies
            .get(&name.to_uppercase())
            .ok_or_else(|| CostError::reference_not_found(CatalogTable::Assemblies.name(), name))
    }

    pub fn construction_material(&self, material_index: &str) -> CostResult<&ConstructionMaterialRow> {
        self.construction_materials
            .get(&material_index.to_uppercase())
            .ok_or_else(|| {
                CostError::reference_not_found(
                    CatalogTable::ConstructionMaterials.name(),
                    material_index,
                )
            })
    }

    pub fn constructions(&self) -> &[ConstructionRow] {
        &self.constructions
    }

    /// Constructions of one construction type, in file order
    pub fn constructions_of_type(&self, type_name: &str) -> Vec<&ConstructionRow> {
        self.constructions
            .iter()
            .filter(|c| c.construction_type_name.eq_ignore_ascii_case(type_name))
            .collect()
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn localization(&self) -> &LocalizationTable {
        &self.localization
    }
}

/// Read one table with serde, numbering rows as they appear in the file
/// (header is row 1).
fn read_table<T: DeserializeOwned>(
    table: CatalogTable,
    paths: &CatalogPaths,
) -> CostResult<Vec<(usize, T)>> {
    let path = paths.path(table);
    read_csv(table, &path)
}

fn read_csv<T: DeserializeOwned>(table: CatalogTable, path: &Path) -> CostResult<Vec<(usize, T)>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| {
            CostError::file_error("open", path.display().to_string(), e.to_string())
        })?;

    let mut rows = Vec::new();
    for (index, result) in reader.deserialize::<T>().enumerate() {
        let row = index + 2;
        let record = result.map_err(|e| {
            CostError::validation_failed(table.name(), row.to_string(), e.to_string())
        })?;
        rows.push((row, record));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::sample_catalog;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let store = sample_catalog();
        assert_eq!(store.get_catalog_item("aa1").unwrap().id, "AA1");
        assert_eq!(store.get_catalog_item(" AA1 ").unwrap().material_op_cost, 10.0);
    }

    #[test]
    fn test_missing_item_is_error() {
        let store = sample_catalog();
        let err = store.get_catalog_item("NOPE").unwrap_err();
        assert_eq!(err, CostError::catalog_item_not_found("NOPE"));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut store = CatalogStore::new();
        store.insert_item(CatalogItem::new("AA1", 1.0, 1.0, 0.0)).unwrap();
        let err = store
            .insert_item(CatalogItem::new("aa1", 2.0, 2.0, 0.0))
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
    }

    #[test]
    fn test_family_rows_keep_file_order() {
        let store = sample_catalog();
        let sizes: Vec<_> = store
            .equipment_family("boilers")
            .iter()
            .map(|r| r.size)
            .collect();
        assert_eq!(sizes, vec![Some(50.0), Some(100.0), Some(200.0)]);
        assert!(store.has_family("BOILERS"));
        assert!(store.equipment_family("Unknown").is_empty());
    }

    #[test]
    fn test_validate_catches_dangling_equipment_id() {
        let mut store = sample_catalog();
        store
            .insert_equipment(EquipmentRow {
                material_id: "GHOST".to_string(),
                family: "Boilers".to_string(),
                size: Some(10.0),
                fuel: None,
                unit: "kW".to_string(),
                description: String::new(),
                catalog_id: "ZZ999".to_string(),
                material_mult: 1.0,
                labour_mult: 1.0,
            })
            .unwrap();
        let err = store.validate().unwrap_err();
        assert!(err.to_string().contains("ZZ999"));
    }

    #[test]
    fn test_validate_catches_zero_capacity_family() {
        let mut store = sample_catalog();
        store
            .insert_equipment(EquipmentRow {
                material_id: "Z1".to_string(),
                family: "Empty Pumps".to_string(),
                size: Some(0.0),
                fuel: None,
                unit: "L/s".to_string(),
                description: String::new(),
                catalog_id: "AA1".to_string(),
                material_mult: 1.0,
                labour_mult: 1.0,
            })
            .unwrap();
        let err = store.validate().unwrap_err();
        assert!(err.to_string().contains("EMPTY PUMPS"));
    }

    #[test]
    fn test_validate_catches_unknown_layer() {
        let mut store = sample_catalog();
        store.insert_construction(ConstructionRow {
            construction_type_name: "Broken".to_string(),
            kind: ConstructionKind::Opaque,
            rsi_k_m2_per_w: Some(1.0),
            u_w_per_m2_k: None,
            material_layers: vec!["NOT-A-LAYER".to_string()],
            description: String::new(),
        });
        assert!(store.validate().is_err());
    }

    #[test]
    fn test_sample_catalog_is_valid() {
        assert!(sample_catalog().validate().is_ok());
    }

    #[test]
    fn test_store_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CatalogStore>();
    }

    #[test]
    fn test_read_csv_reports_row_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("costs.csv");
        std::fs::write(
            &path,
            "id,material_op_cost,labor_op_cost,equipment_op_cost\nAA1,1,2,3\nAA2,abc,2,3\n",
        )
        .unwrap();
        let err = read_csv::<CostRecord>(CatalogTable::Costs, &path).unwrap_err();
        match err {
            CostError::ValidationFailed { table, row, .. } => {
                assert_eq!(table, "costs");
                assert_eq!(row, "3");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
