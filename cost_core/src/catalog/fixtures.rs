//! Small hand-built catalog shared by unit tests.

use super::*;

fn equipment(
    material_id: &str,
    family: &str,
    size: Option<f64>,
    fuel: Option<&str>,
    catalog_id: &str,
    description: &str,
) -> EquipmentRow {
    EquipmentRow {
        material_id: material_id.to_string(),
        family: family.to_string(),
        size,
        fuel: fuel.map(str::to_string),
        unit: "each".to_string(),
        description: description.to_string(),
        catalog_id: catalog_id.to_string(),
        material_mult: 1.0,
        labour_mult: 1.0,
    }
}

fn layer(index: &str, catalog_id: &str, quantity: f64) -> ConstructionMaterialRow {
    ConstructionMaterialRow {
        material_index: index.to_string(),
        catalog_id: catalog_id.to_string(),
        quantity,
        material_mult: 1.0,
        labour_mult: 1.0,
        description: format!("layer {index}"),
    }
}

fn construction(
    name: &str,
    kind: ConstructionKind,
    rsi: Option<f64>,
    u: Option<f64>,
    layers: &[&str],
) -> ConstructionRow {
    ConstructionRow {
        construction_type_name: name.to_string(),
        kind,
        rsi_k_m2_per_w: rsi,
        u_w_per_m2_k: u,
        material_layers: layers.iter().map(|l| l.to_string()).collect(),
        description: String::new(),
    }
}

/// Catalog with one item per pricing path:
///
/// - `AA1` (10, 5, 0), localized in Toronto at (110, 90, 100)
/// - `Boilers` family at 50/100/200 kW
/// - `Branch Distributors` family keyed by connections (`Fuel`) and capacity
/// - `Chillers` family at 100/300/500 kW
/// - `AHU-BASIC` assembly of two fans and a coil
/// - `Wall-Steel` opaque curve at RSI 2 and 4, `Window-Std` glazing at U 2 and 1
pub(crate) fn sample_catalog() -> CatalogStore {
    let mut store = CatalogStore::new();

    let items = [
        ("AA1", 10.0, 5.0, 0.0),
        ("AB100", 1000.0, 500.0, 0.0),
        ("AB101", 1800.0, 700.0, 0.0),
        ("AB102", 3000.0, 1000.0, 100.0),
        ("BD001", 100.0, 50.0, 0.0),
        ("BD002", 180.0, 80.0, 0.0),
        ("BD003", 250.0, 100.0, 0.0),
        ("BD004", 400.0, 150.0, 0.0),
        ("HC501", 20000.0, 5000.0, 0.0),
        ("HC502", 50000.0, 9000.0, 0.0),
        ("HC503", 70000.0, 12000.0, 0.0),
        ("VE10", 300.0, 100.0, 0.0),
        ("VE11", 500.0, 200.0, 50.0),
        ("EN1", 2.0, 1.0, 0.0),
        ("EN2", 1.5, 0.5, 0.0),
        ("EN3", 30.0, 10.0, 0.0),
    ];
    for (id, m, l, e) in items {
        store.insert_item(CatalogItem::new(id, m, l, e)).unwrap();
    }

    let rows = [
        equipment("B50", "Boilers", Some(50.0), Some("Gas"), "AB100", "boiler 50kW"),
        equipment("B100", "Boilers", Some(100.0), Some("Gas"), "AB101", "boiler 100kW"),
        equipment("B200", "Boilers", Some(200.0), Some("Gas"), "AB102", "boiler 200kW"),
        equipment("BD-2-10", "Branch Distributors", Some(10.0), Some("2"), "BD001", "distributor"),
        equipment("BD-4-20", "Branch Distributors", Some(20.0), Some("4"), "BD002", "distributor"),
        equipment("BD-4-40", "Branch Distributors", Some(40.0), Some("4"), "BD003", "distributor"),
        equipment("BD-8-40", "Branch Distributors", Some(40.0), Some("8"), "BD004", "distributor"),
        equipment("CH100", "Chillers", Some(100.0), None, "HC501", "chiller"),
        equipment("CH300", "Chillers", Some(300.0), None, "HC502", "chiller"),
        equipment("CH500", "Chillers", Some(500.0), None, "HC503", "chiller"),
        equipment("FAN1", "AHU Components", None, None, "VE10", "supply fan"),
        equipment("COIL1", "AHU Components", None, None, "VE11", "heating coil"),
    ];
    for row in rows {
        store.insert_equipment(row).unwrap();
    }

    store
        .insert_assembly(AssemblyRow {
            name: "AHU-Basic".to_string(),
            component_ids: vec!["FAN1".to_string(), "COIL1".to_string()],
            component_quantities: vec![2.0, 1.0],
        })
        .unwrap();

    for row in [layer("M1", "EN1", 1.0), layer("M2", "EN2", 1.0), layer("G1", "EN3", 0.0)] {
        store.insert_construction_material(row).unwrap();
    }
    store.insert_construction(construction(
        "Wall-Steel",
        ConstructionKind::Opaque,
        Some(2.0),
        None,
        &["M1", "M2"],
    ));
    store.insert_construction(construction(
        "Wall-Steel",
        ConstructionKind::Opaque,
        Some(4.0),
        None,
        &["M1", "M2", "M2"],
    ));
    store.insert_construction(construction(
        "Window-Std",
        ConstructionKind::Glazing,
        None,
        Some(2.0),
        &["G1"],
    ));
    store.insert_construction(construction(
        "Window-Std",
        ConstructionKind::Glazing,
        None,
        Some(1.0),
        &["G1", "G1"],
    ));

    for (prefix, m, i, t) in [
        ("AA", 110.0, 90.0, 100.0),
        ("AB", 100.0, 100.0, 100.0),
        ("BD", 100.0, 100.0, 100.0),
        ("HC", 100.0, 100.0, 100.0),
        ("VE", 100.0, 100.0, 100.0),
        ("EN", 100.0, 100.0, 100.0),
    ] {
        store.insert_localization_factor(LocalizationFactor::new("ON", "Toronto", prefix, m, i, t));
    }

    store.insert_location(Location {
        province_state: "ON".to_string(),
        city: "Toronto".to_string(),
        latitude: 43.65,
        longitude: -79.38,
    });
    store.insert_location(Location {
        province_state: "BC".to_string(),
        city: "Vancouver".to_string(),
        latitude: 49.28,
        longitude: -123.12,
    });

    store
}
